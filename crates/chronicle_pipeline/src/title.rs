//! Two-phase title enrichment.
//!
//! Phase one pulls evocative fragments out of the text at high sampling
//! diversity; its failure only costs the fragments. Phase two shapes ranked
//! candidates from them, which are normalized and deduplicated.

use crate::dispatcher::require_target;
use crate::{
    ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload, extract_json, normalize_titles,
    parse_error, strip_wrapper,
};
use chrono::Utc;
use chronicle_core::{CallType, TitleRecord};
use chronicle_error::ChronicleResult;
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Candidates kept after phase two.
pub const TITLE_CANDIDATES: usize = 5;

/// Upper bound on phase-one fragments.
pub const MAX_FRAGMENTS: usize = 12;

const FRAGMENTS_SYSTEM_PROMPT: &str = "You mine texts for title material. Pull out 8 to 12 \
short, striking fragments: images, phrases, objects, names of places or things. Respond with \
a single JSON object and nothing else.";

const CANDIDATES_SYSTEM_PROMPT: &str = "You title chronicles. Titles are short, concrete and \
specific to the text. Respond with a single JSON object and nothing else.";

#[derive(Debug, Deserialize)]
struct FragmentsResponse {
    fragments: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(alias = "candidates")]
    titles: Vec<String>,
}

/// Lines of a plain-text answer, used when no JSON came back.
fn answer_lines(response: &str) -> Vec<String> {
    strip_wrapper(response)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse phase-one fragments, trimmed, non-empty, capped.
pub fn parse_fragments(response: &str) -> Vec<String> {
    let fragments = extract_json(response)
        .and_then(|json| serde_json::from_str::<FragmentsResponse>(&json).ok())
        .map(|r| r.fragments)
        .unwrap_or_else(|| answer_lines(response));
    fragments
        .into_iter()
        .map(|f| f.trim().trim_matches('"').to_string())
        .filter(|f| !f.is_empty())
        .take(MAX_FRAGMENTS)
        .collect()
}

/// Shape phase-two candidates: normalize, drop literal fragments, keep the top five.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::shape_candidates;
///
/// let raw = vec![
///     "the shadow of the city".to_string(),
///     "The Shadow Of The City".to_string(),
///     "salt and ash".to_string(),
/// ];
/// let fragments = vec!["Salt and Ash".to_string()];
/// assert_eq!(shape_candidates(raw, &fragments), vec!["The Shadow of the City"]);
/// ```
pub fn shape_candidates(raw: Vec<String>, fragments: &[String]) -> Vec<String> {
    normalize_titles(raw)
        .into_iter()
        .filter(|title| !fragments.iter().any(|f| f.trim().eq_ignore_ascii_case(title)))
        .take(TITLE_CANDIDATES)
        .collect()
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Title the targeted version.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn title(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let version = require_target(&record, task.version_id().as_deref())?;

        let fragments_prompt = format!(
            "{}\n\nRespond with JSON: {{\"fragments\": [\"...\"]}}",
            version.content
        );
        let fragments = match recorder
            .call(
                self.call(CallType::TitleFragments),
                FRAGMENTS_SYSTEM_PROMPT,
                &fragments_prompt,
            )
            .await
        {
            Ok(response) => parse_fragments(&response.text),
            Err(e) if e.is_aborted() => return Err(e),
            Err(e) => {
                warn!(error = %e.user_message(), "Title fragment extraction failed, continuing without fragments");
                Vec::new()
            }
        };
        debug!(fragments = fragments.len(), "Title fragments extracted");

        let material = if fragments.is_empty() {
            String::from("(no fragments; work from the text)")
        } else {
            fragments
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let excerpt: String = version.content.chars().take(4000).collect();
        let candidates_prompt = format!(
            "## Fragments\n{}\n\n## Text\n{}\n\n\
             Propose exactly {} titles, best first. Use the fragments as raw material but \
             never reproduce a fragment word for word.\n\
             Respond with JSON: {{\"titles\": [\"...\"]}}",
            material, excerpt, TITLE_CANDIDATES
        );
        let response = recorder
            .call(
                self.call(CallType::TitleCandidates),
                CANDIDATES_SYSTEM_PROMPT,
                &candidates_prompt,
            )
            .await?;
        let raw = extract_json(&response.text)
            .and_then(|json| serde_json::from_str::<CandidatesResponse>(&json).ok())
            .map(|r| r.titles)
            .unwrap_or_else(|| answer_lines(&response.text));

        let candidates = shape_candidates(raw, &fragments);
        let Some(title) = candidates.first().cloned() else {
            return Err(parse_error(
                "title",
                "no usable title candidates",
                &response.text,
            ));
        };

        let stored = TitleRecord {
            title: title.clone(),
            candidates: candidates.clone(),
            fragments: fragments.clone(),
            source_version_id: version.id.clone(),
            generated_at: Utc::now(),
        };
        self.repository.update_title(&record.id, stored).await?;
        info!(title = %title, candidates = candidates.len(), "Title stored");
        Ok(StepPayload::Title {
            title,
            candidates,
            fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_fall_back_to_lines() {
        let fragments = parse_fragments("salt on the oars\n\"the drowned bell\"\n\n");
        assert_eq!(fragments, vec!["salt on the oars", "the drowned bell"]);
    }

    #[test]
    fn fragments_are_capped() {
        let many: Vec<String> = (0..20).map(|i| format!("\"f{}\"", i)).collect();
        let json = format!("{{\"fragments\": [{}]}}", many.join(","));
        assert_eq!(parse_fragments(&json).len(), MAX_FRAGMENTS);
    }

    #[test]
    fn candidates_are_deduplicated_and_capped() {
        let raw = (0..8)
            .map(|i| format!("title number {}", i))
            .chain(["Title Number 0".to_string()])
            .collect();
        let shaped = shape_candidates(raw, &[]);
        assert_eq!(shaped.len(), TITLE_CANDIDATES);
        assert_eq!(shaped[0], "Title Number 0");
    }
}
