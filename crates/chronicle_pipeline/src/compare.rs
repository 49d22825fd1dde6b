//! Comparative analysis across versions and the combine merge.

use crate::dispatcher::{require_versions, response_text, version_payload};
use crate::prompts::author_system_prompt;
use crate::{ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload};
use chrono::Utc;
use chronicle_core::{
    CallType, ChronicleRecord, ChronicleVersion, ComparisonReport, NarrativeStyle, SamplingMode,
    VersionStep,
};
use chronicle_error::ChronicleResult;
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

static COMBINE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s{0,3}#{1,4}\s*combine\s+instructions\b.*$")
        .expect("Valid combine instructions heading regex")
});

const DOCUMENT_DIMENSIONS: &[&str] = &[
    "documentary believability: does it read as a real artifact of its world",
    "voice of the in-world author and consistency of their perspective",
    "conventions of the document type (layout, register, formulae)",
    "how much history the document reveals without explaining itself",
    "fidelity to the cast, facts and period",
];

const STORY_DIMENSIONS: &[&str] = &[
    "prose craft: sentence rhythm, imagery, economy",
    "structure and pacing of the arc",
    "characterization of the cast and the clarity of their motives",
    "thematic coherence and use of motifs",
    "fidelity to the cast, facts and period",
];

fn dimensions(style: &NarrativeStyle) -> &'static [&'static str] {
    if style.is_document() {
        DOCUMENT_DIMENSIONS
    } else {
        STORY_DIMENSIONS
    }
}

/// Extract the combine instructions paragraph from a comparison report.
///
/// Everything after a heading reading "Combine Instructions" (any case,
/// depth one to four) is returned trimmed. No heading, or nothing after it,
/// yields `None`.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::extract_combine_instructions;
///
/// let report = "## Analysis\nB is tighter.\n\n### combine INSTRUCTIONS\nKeep B's opening.\n";
/// assert_eq!(extract_combine_instructions(report).as_deref(), Some("Keep B's opening."));
/// assert_eq!(extract_combine_instructions("No headings here."), None);
/// ```
pub fn extract_combine_instructions(report: &str) -> Option<String> {
    let heading = COMBINE_HEADING.find(report)?;
    let instructions = report[heading.end()..].trim();
    (!instructions.is_empty()).then(|| instructions.to_string())
}

/// Label for the n-th version in a comparison block: A, B, ..., Z, V27, ...
fn version_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("V{}", index + 1),
    }
}

/// Every version, labeled, with word count and full content.
pub fn version_block(record: &ChronicleRecord) -> String {
    let mut block = String::new();
    for (index, version) in record.versions.iter().enumerate() {
        let _ = write!(
            block,
            "## Version {} ({} words, {}{})\n\n{}\n\n",
            version_label(index),
            version.word_count,
            version.step,
            if version.sampling_mode == SamplingMode::Low {
                ", low sampling"
            } else {
                ""
            },
            version.content.trim()
        );
    }
    block
}

fn compare_prompt(record: &ChronicleRecord) -> String {
    let mut prompt = String::from("Compare these versions of the same chronicle.\n\n");
    prompt.push_str(&version_block(record));
    prompt.push_str("Assess every version on each dimension:\n");
    for dimension in dimensions(&record.context.style) {
        let _ = writeln!(prompt, "- {}", dimension);
    }
    prompt.push_str(
        "\nStructure your answer under exactly these headings, in order:\n\
         ## Analysis\n## Recommendation\n## Combine Instructions\n\n\
         The combine instructions are one paragraph telling an editor how to merge \
         the strongest parts of the versions into a single draft.",
    );
    prompt
}

fn combine_prompt(record: &ChronicleRecord, instructions: Option<&str>) -> String {
    let mut prompt = String::from("Merge these versions into a single, finished draft.\n\n");
    prompt.push_str(&version_block(record));
    match instructions {
        Some(instructions) => {
            let _ = write!(
                prompt,
                "Follow these editorial instructions above all else:\n{}\n",
                instructions
            );
        }
        None => {
            prompt.push_str(
                "For each dimension below, keep whichever version handles it best:\n",
            );
            for dimension in dimensions(&record.context.style) {
                let _ = writeln!(prompt, "- {}", dimension);
            }
        }
    }
    prompt.push_str("\nRespond with the merged text only.");
    prompt
}

const COMPARE_SYSTEM_PROMPT: &str = "You are an exacting literary editor comparing drafts \
of a chronicle set in a generated fantasy world. Be concrete and cite passages.";

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Compare every version and store the report.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn compare(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        require_versions(&record, 2)?;

        let response = recorder
            .call(
                self.call(CallType::Compare),
                COMPARE_SYSTEM_PROMPT,
                &compare_prompt(&record),
            )
            .await?;
        let text = response_text(&response, "comparison")?;
        let combine_instructions = extract_combine_instructions(&text);
        debug!(
            has_instructions = combine_instructions.is_some(),
            "Comparison report received"
        );

        let report = ComparisonReport {
            text,
            combine_instructions,
            version_ids: record.versions.iter().map(|v| v.id.clone()).collect(),
            generated_at: Utc::now(),
        };
        self.repository
            .update_comparison_report(&record.id, report.clone())
            .await?;
        Ok(StepPayload::Comparison { report })
    }

    /// Merge the versions, guided by the last comparison's instructions when present.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn combine(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let mut record = self.load_for(task).await?;
        require_versions(&record, 2)?;

        let instructions = record
            .comparison_report
            .as_ref()
            .and_then(|r| r.combine_instructions.as_deref());
        let user_prompt = combine_prompt(&record, instructions);
        let response = recorder
            .call(
                self.call(CallType::Combine),
                &author_system_prompt(&record.context.style),
                &user_prompt,
            )
            .await?;
        let content = response_text(&response, "combine")?;

        let version = ChronicleVersion::new(content, VersionStep::Combine, SamplingMode::Normal);
        let payload = version_payload(&version);
        record.push_version(version);
        self.repository.put(&record).await?;
        info!(versions = record.versions.len(), "Versions combined");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_found_at_every_heading_depth() {
        for hashes in ["#", "##", "###", "####"] {
            let report = format!(
                "{hashes} Analysis\nA is warmer.\n{hashes} Combine Instructions\n\nUse A's ending.\n"
            );
            assert_eq!(
                extract_combine_instructions(&report).as_deref(),
                Some("Use A's ending."),
                "depth {}",
                hashes.len()
            );
        }
    }

    #[test]
    fn instructions_heading_is_case_insensitive() {
        let report = "## COMBINE instructions:\nMerge the middle sections.";
        assert_eq!(
            extract_combine_instructions(report).as_deref(),
            Some("Merge the middle sections.")
        );
    }

    #[test]
    fn deeper_headings_and_plain_mentions_do_not_match() {
        assert_eq!(
            extract_combine_instructions("##### Combine Instructions\nNope."),
            None
        );
        assert_eq!(
            extract_combine_instructions("See the combine instructions below."),
            None
        );
    }

    #[test]
    fn empty_instructions_are_none() {
        assert_eq!(extract_combine_instructions("## Combine Instructions\n   \n"), None);
    }

    #[test]
    fn labels_run_past_the_alphabet() {
        assert_eq!(version_label(0), "A");
        assert_eq!(version_label(25), "Z");
        assert_eq!(version_label(26), "V27");
    }
}
