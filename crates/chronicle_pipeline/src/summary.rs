//! Summary enrichment.

use crate::dispatcher::require_target;
use crate::{
    ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload, extract_json, strip_wrapper,
};
use chrono::Utc;
use chronicle_core::{CallType, SummaryRecord};
use chronicle_error::{ChronicleResult, GenerationError, GenerationErrorKind};
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use serde::Deserialize;
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str = "You write two- to four-sentence summaries of chronicles for a \
table of contents. Name the central figures and what changes. Do not editorialize.";

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

/// Pull the summary out of a response.
///
/// A JSON `summary` field wins; otherwise the whole response is used once
/// wrapper formatting is stripped. Returns `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::summary_text;
///
/// assert_eq!(summary_text("{\"summary\": \"Ships burn.\"}").as_deref(), Some("Ships burn."));
/// assert_eq!(summary_text("Summary: Ships burn.").as_deref(), Some("Ships burn."));
/// assert_eq!(summary_text("  "), None);
/// ```
pub fn summary_text(response: &str) -> Option<String> {
    let structured = extract_json(response)
        .and_then(|json| serde_json::from_str::<SummaryResponse>(&json).ok())
        .map(|r| r.summary.trim().to_string())
        .filter(|s| !s.is_empty());
    let text = structured.unwrap_or_else(|| {
        debug!("No structured summary field, falling back to raw text");
        strip_wrapper(response)
    });
    (!text.is_empty()).then_some(text)
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Summarize the targeted version.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn summary(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let version = require_target(&record, task.version_id().as_deref())?;

        let prompt = format!(
            "{}\n\nRespond with JSON: {{\"summary\": \"...\"}}",
            version.content
        );
        let response = recorder
            .call(self.call(CallType::Summary), SYSTEM_PROMPT, &prompt)
            .await?;
        let summary = summary_text(&response.text).ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::EmptyResponse("summary".to_string()))
        })?;

        let stored = SummaryRecord {
            text: summary.clone(),
            source_version_id: version.id.clone(),
            generated_at: Utc::now(),
        };
        self.repository.update_summary(&record.id, stored).await?;
        info!(version_id = %version.id, "Summary stored");
        Ok(StepPayload::Summary {
            summary,
            version_id: version.id.clone(),
        })
    }
}
