//! Consistency checks: temporal alignment and unanchored references.

use crate::dispatcher::{precondition, require_target};
use crate::prompts::temporal_block;
use crate::{
    Candidate, ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload, is_known_name,
    parse_error, parse_response, scan_candidates,
};
use chrono::Utc;
use chronicle_core::{
    CallType, QuickCheckAssessment, QuickCheckReport, Suspect, SuspectConfidence,
    TemporalAlignment, TemporalCheckReport,
};
use chronicle_error::ChronicleResult;
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use serde::Deserialize;
use std::fmt::Write;
use std::str::FromStr;
use tracing::{debug, info, instrument};

const TEMPORAL_SYSTEM_PROMPT: &str = "You check whether a chronicle is consistent with the \
period it is set in. Respond with a single JSON object and nothing else.";

const QUICK_CHECK_SYSTEM_PROMPT: &str = "You review names in a chronicle. Each candidate is a \
capitalized phrase that matches no known name in the world. Decide which are invented proper \
nouns (people, places, factions, titles) that the world does not contain. Respond with a \
single JSON object and nothing else.";

#[derive(Debug, Deserialize)]
struct TemporalCheckResponse {
    alignment: String,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct QuickCheckResponse {
    #[serde(default)]
    suspects: Vec<Suspect>,
}

/// Assessment implied by a suspect list.
pub fn assess(suspects: &[Suspect]) -> QuickCheckAssessment {
    if suspects.is_empty() {
        QuickCheckAssessment::Clean
    } else if suspects
        .iter()
        .any(|s| s.confidence == SuspectConfidence::High)
    {
        QuickCheckAssessment::Flagged
    } else {
        QuickCheckAssessment::Minor
    }
}

fn candidate_list(candidates: &[Candidate]) -> String {
    let mut list = String::new();
    for candidate in candidates {
        let _ = writeln!(list, "- \"{}\" in: ...{}...", candidate.phrase, candidate.context);
    }
    list
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Rate how well the active version fits its temporal context.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn temporal_check(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let version = require_target(&record, None)?;
        let Some(temporal) = &record.temporal_context else {
            return Err(precondition(format!(
                "chronicle {} has no temporal context",
                record.id
            )));
        };

        let prompt = format!(
            "{}\n## Chronicle\n{}\n\nRate the alignment as one of misaligned, weak, adequate, \
             strong, list concrete issues (anachronisms, events outside the tick range, eras \
             confused), and summarize.\n\
             Respond with JSON: {{\"alignment\": \"...\", \"issues\": [\"...\"], \"summary\": \"...\"}}",
            temporal_block(temporal, &record.context),
            version.content
        );
        let response = recorder
            .call(
                self.call(CallType::TemporalCheck),
                TEMPORAL_SYSTEM_PROMPT,
                &prompt,
            )
            .await?;

        let parsed: TemporalCheckResponse = parse_response(&response.text, "temporal check")?;
        let alignment = TemporalAlignment::from_str(parsed.alignment.trim()).map_err(|_| {
            parse_error(
                "temporal check",
                &format!("unknown alignment '{}'", parsed.alignment),
                &response.text,
            )
        })?;

        let report = TemporalCheckReport {
            alignment,
            issues: parsed.issues,
            summary: parsed.summary,
            version_id: version.id.clone(),
            generated_at: Utc::now(),
        };
        self.repository
            .update_temporal_check(&record.id, report.clone())
            .await?;
        info!(alignment = %report.alignment, issues = report.issues.len(), "Temporal check stored");
        Ok(StepPayload::TemporalCheck { report })
    }

    /// Find proper-noun-like phrases the world does not know about.
    ///
    /// Candidates come from a local scan; the text service only judges them.
    /// With no candidates the report is clean and no call is made. Suspects
    /// naming a known entity are dropped whatever the service says.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn quick_check(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let version = require_target(&record, None)?;
        let known = record.context.known_names();
        let candidates = scan_candidates(&version.content, &known, self.quick_check.max_candidates);
        debug!(candidates = candidates.len(), "Local name scan complete");

        let suspects = if candidates.is_empty() {
            Vec::new()
        } else {
            let prompt = format!(
                "## Known names\n{}\n\n## Candidates\n{}\n\
                 For each candidate that is an invented proper noun, give a confidence of low, \
                 medium or high and a short reason.\n\
                 Respond with JSON: {{\"suspects\": [{{\"phrase\": \"...\", \"context\": \"...\", \
                 \"confidence\": \"low|medium|high\", \"reason\": \"...\"}}]}}",
                known.join(", "),
                candidate_list(&candidates)
            );
            let response = recorder
                .call(
                    self.call(CallType::QuickCheck),
                    QUICK_CHECK_SYSTEM_PROMPT,
                    &prompt,
                )
                .await?;
            let parsed: QuickCheckResponse = parse_response(&response.text, "quick check")?;
            parsed
                .suspects
                .into_iter()
                .filter(|s| !s.phrase.trim().is_empty() && !is_known_name(&s.phrase, &known))
                .collect()
        };

        let report = QuickCheckReport {
            assessment: assess(&suspects),
            suspects,
            version_id: version.id.clone(),
            generated_at: Utc::now(),
        };
        self.repository
            .update_quick_check(&record.id, report.clone())
            .await?;
        info!(assessment = %report.assessment, suspects = report.suspects.len(), "Quick check stored");
        Ok(StepPayload::QuickCheck { report })
    }
}
