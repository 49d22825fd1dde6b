//! Primary generation and the three regeneration policies.
//!
//! Every handler appends exactly one version on success and writes nothing
//! on failure.

use crate::dispatcher::{precondition, response_text, version_payload};
use crate::prompts::{
    author_system_prompt, cast_block, neighborhood_block, perspective_block, temporal_block,
};
use crate::{
    ChronicleDispatcher, ChronicleTask, CostRecorder, Neighborhood, StepPayload,
    select_neighborhood, synthesize_perspective,
};
use chronicle_core::{
    CallType, ChronicleContext, ChronicleRecord, ChronicleVersion, PerspectiveRecord,
    PerspectiveSynthesis, SamplingMode, StoredPrompts, TemporalContext, VersionStep,
};
use chronicle_error::{ChronicleError, ChronicleResult, StepError, StepErrorKind};
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use tracing::{info, instrument};

/// Extra framing for creative regeneration.
const CREATIVE_FRAMING: &str = "Treat the brief as a starting point rather than a plan. \
Take a bolder structural or tonal approach than a conventional telling would: an unexpected \
narrator, a non-linear order, a narrower or wider lens. Keep every world fact intact.";

/// Build the literal prompts for a generation call.
pub fn generation_prompts(
    context: &ChronicleContext,
    temporal: Option<&TemporalContext>,
    hood: &Neighborhood,
    synthesis: &PerspectiveSynthesis,
) -> StoredPrompts {
    let mut user = perspective_block(synthesis);
    user.push('\n');
    user.push_str(&cast_block(context));
    user.push('\n');
    user.push_str(&neighborhood_block(hood));
    if let Some(temporal) = temporal {
        user.push_str(&temporal_block(temporal, context));
        user.push('\n');
    }
    if let Some(direction) = &context.narrative_direction {
        user.push_str(&format!("## Author direction\n{}\n\n", direction));
    }
    user.push_str(if context.style.is_document() {
        "Write the document now."
    } else {
        "Write the chronicle now."
    });

    StoredPrompts {
        system: author_system_prompt(&context.style),
        user,
    }
}

/// Output of a synthesis-plus-generation run.
struct Draft {
    perspective: PerspectiveRecord,
    prompts: StoredPrompts,
    content: String,
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    async fn synthesize_and_write(
        &self,
        context: &ChronicleContext,
        temporal: Option<&TemporalContext>,
        call_type: CallType,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<Draft> {
        let hood = select_neighborhood(context, temporal, &self.neighborhood);
        let perspective = synthesize_perspective(
            recorder,
            self.call(CallType::Perspective),
            context,
            temporal,
            &hood,
        )
        .await?;
        let prompts = generation_prompts(context, temporal, &hood, &perspective.output);
        let response = recorder
            .call(self.call(call_type), &prompts.system, &prompts.user)
            .await?;
        let content = response_text(&response, "chronicle")?;
        Ok(Draft {
            perspective,
            prompts,
            content,
        })
    }

    /// Primary generation: synthesis, neighborhood, one generation call.
    ///
    /// Runs against a pending shell when one exists, using the shell's
    /// stored context if the task carries none.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn generate_v2(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let chronicle_id = recorder.chronicle_id().to_string();
        let existing = self.repository.get(&chronicle_id).await?;
        if let Some(record) = &existing {
            if record.is_accepted() {
                Err(StepError::new(StepErrorKind::Locked {
                    chronicle_id: chronicle_id.clone(),
                    step: task.step().to_string(),
                }))?
            }
            if !record.versions.is_empty() {
                return Err(precondition(format!(
                    "chronicle {} already has content; use a regeneration step",
                    chronicle_id
                )));
            }
        }

        let context = task
            .context()
            .clone()
            .or_else(|| {
                existing
                    .as_ref()
                    .map(|r| r.context.clone())
                    .filter(|c| !c.role_assignments.is_empty())
            })
            .ok_or_else(|| {
                ChronicleError::from(StepError::new(StepErrorKind::MissingContext(
                    task.step().to_string(),
                )))
            })?;
        let temporal = task
            .temporal_context()
            .clone()
            .or_else(|| existing.as_ref().and_then(|r| r.temporal_context.clone()));

        let draft = self
            .synthesize_and_write(&context, temporal.as_ref(), CallType::Generation, recorder)
            .await?;

        let is_new = existing.is_none();
        let mut record = match existing {
            Some(mut shell) => {
                shell.context = context;
                shell.temporal_context = temporal;
                shell
            }
            None => ChronicleRecord::new(chronicle_id, context, temporal),
        };
        record.perspective = Some(draft.perspective);
        record.prompts = Some(draft.prompts);
        let version =
            ChronicleVersion::new(draft.content, VersionStep::Generate, SamplingMode::Normal);
        let payload = version_payload(&version);
        record.push_version(version);

        if is_new {
            self.repository.create(&record).await?;
        } else {
            self.repository.put(&record).await?;
        }
        info!(is_new, "Chronicle generated");
        Ok(payload)
    }

    /// Full regeneration: re-run synthesis and generation, replacing the perspective.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn regenerate_full(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let mut record = self.load_for(task).await?;
        if record.context.role_assignments.is_empty() {
            return Err(precondition(format!(
                "chronicle {} has no stored generation context",
                record.id
            )));
        }

        let draft = self
            .synthesize_and_write(
                &record.context,
                record.temporal_context.as_ref(),
                CallType::Regeneration,
                recorder,
            )
            .await?;

        record.perspective = Some(draft.perspective);
        record.prompts = Some(draft.prompts);
        let version =
            ChronicleVersion::new(draft.content, VersionStep::Regenerate, SamplingMode::Normal);
        let payload = version_payload(&version);
        record.push_version(version);
        self.repository.put(&record).await?;
        info!(versions = record.versions.len(), "Chronicle fully regenerated");
        Ok(payload)
    }

    /// Creative regeneration: reuse the stored synthesis with looser framing.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn regenerate_creative(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let mut record = self.load_for(task).await?;
        if record.context.style.is_document() {
            return Err(precondition("creative regeneration requires a story-format style"));
        }
        let Some(perspective) = &record.perspective else {
            return Err(precondition(format!(
                "chronicle {} has no perspective synthesis",
                record.id
            )));
        };

        let hood = select_neighborhood(
            &record.context,
            record.temporal_context.as_ref(),
            &self.neighborhood,
        );
        let prompts = generation_prompts(
            &record.context,
            record.temporal_context.as_ref(),
            &hood,
            &perspective.output,
        );
        let system = format!("{}\n\n{}", prompts.system, CREATIVE_FRAMING);
        let response = recorder
            .call(self.call(CallType::Regeneration), &system, &prompts.user)
            .await?;
        let content = response_text(&response, "chronicle")?;

        let version = ChronicleVersion::new(content, VersionStep::Creative, SamplingMode::Normal);
        let payload = version_payload(&version);
        record.push_version(version);
        self.repository.put(&record).await?;
        info!(versions = record.versions.len(), "Chronicle creatively regenerated");
        Ok(payload)
    }

    /// Sampling-only regeneration: the stored prompts with a different nucleus cutoff.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn regenerate_temperature(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let mut record = self.load_for(task).await?;
        let Some(prompts) = record.prompts.clone() else {
            return Err(precondition(format!(
                "chronicle {} has no stored prompts",
                record.id
            )));
        };

        let mode = task.sampling_mode().unwrap_or(SamplingMode::Low);
        let call = self.call(CallType::Regeneration);
        let sampling = call.nucleus_sampling(self.sampling.top_p(mode));
        let response = recorder
            .call_with(call, &prompts.system, &prompts.user, sampling)
            .await?;
        let content = response_text(&response, "chronicle")?;

        let version = ChronicleVersion::new(content, VersionStep::Regenerate, mode);
        let payload = version_payload(&version);
        record.push_version(version);
        self.repository.put(&record).await?;
        info!(sampling_mode = %mode, versions = record.versions.len(), "Chronicle resampled");
        Ok(payload)
    }
}
