//! Copy-edit polish of the active version.

use crate::dispatcher::{require_target, response_text, version_payload};
use crate::{ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload};
use chronicle_core::{CallType, ChronicleVersion, NarrativeStyle, SamplingMode, VersionStep};
use chronicle_error::ChronicleResult;
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use tracing::{info, instrument};

const STORY_GUIDANCE: &str = "Tighten sentences, fix grammar and punctuation, remove \
repetition and filler, and smooth transitions. Preserve plot, names, voice and length \
within ten percent.";

const DOCUMENT_GUIDANCE: &str = "Correct errors a careful in-world scribe would not make, \
keep period-appropriate formulae and layout, and remove anything that breaks the frame of \
the document. Preserve names, facts and length within ten percent.";

fn system_prompt(style: &NarrativeStyle) -> String {
    let guidance = if style.is_document() {
        DOCUMENT_GUIDANCE
    } else {
        STORY_GUIDANCE
    };
    format!(
        "You are a copy editor. {}\n\nRespond with the edited text only.",
        guidance
    )
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Polish the active version into a new `copy_edit` version.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn copy_edit(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let mut record = self.load_for(task).await?;
        let source = require_target(&record, None)?.content.clone();

        let response = recorder
            .call(
                self.call(CallType::CopyEdit),
                &system_prompt(&record.context.style),
                &source,
            )
            .await?;
        let content = response_text(&response, "copy edit")?;

        let version = ChronicleVersion::new(content, VersionStep::CopyEdit, SamplingMode::Normal);
        let payload = version_payload(&version);
        record.push_version(version);
        self.repository.put(&record).await?;
        info!(versions = record.versions.len(), "Copy edit applied");
        Ok(payload)
    }
}
