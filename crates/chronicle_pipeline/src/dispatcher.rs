//! Step dispatch.
//!
//! The dispatcher routes a [`ChronicleTask`] to exactly one handler,
//! enforces the shared preconditions (chronicle existence, acceptance lock),
//! and turns every outcome into a [`TaskResult`]. Handlers live in the stage
//! modules as further `impl` blocks on [`ChronicleDispatcher`].
//!
//! Costs are saved to the cost sink as each call returns. The record's cost
//! accumulator is only updated once the step has succeeded.

use crate::{
    AbortSignal, CallProfile, ChronicleTask, CostRecorder, ImageRefsConfig, NeighborhoodConfig,
    PipelineConfig, QuickCheckConfig, ResolvedCall, SamplingConfig, Step, StepOutput, StepPayload,
    TaskRequest, TaskResult,
};
use chrono::Utc;
use chronicle_core::{
    CallType, ChronicleRecord, ChronicleVersion, FailureMarker, GenerateResponse, ModelPricing,
};
use chronicle_error::{
    ChronicleError, ChronicleResult, GenerationError, GenerationErrorKind, JsonError, StepError,
    StepErrorKind,
};
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

/// Routes pipeline steps to their handlers.
///
/// Call settings are resolved once at construction and threaded into every
/// handler from there.
///
/// # Example
///
/// ```rust,ignore
/// use chronicle_pipeline::{AbortSignal, ChronicleDispatcher, ChronicleTask, PipelineConfig, Step};
///
/// let dispatcher = ChronicleDispatcher::new(client, repository, ledger, &PipelineConfig::load()?)?;
/// let task = ChronicleTask::for_chronicle(Step::Summary, "chr-42");
/// let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;
/// assert!(result.success);
/// ```
pub struct ChronicleDispatcher<G, R, C> {
    pub(crate) generator: G,
    pub(crate) repository: R,
    pub(crate) cost_sink: C,
    pub(crate) profile: CallProfile,
    pub(crate) sampling: SamplingConfig,
    pub(crate) pricing: HashMap<String, ModelPricing>,
    pub(crate) neighborhood: NeighborhoodConfig,
    pub(crate) image_refs: ImageRefsConfig,
    pub(crate) quick_check: QuickCheckConfig,
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Create a dispatcher, resolving call settings from the configuration.
    ///
    /// # Errors
    ///
    /// Fails when a call type has no model or token budget configured.
    pub fn new(
        generator: G,
        repository: R,
        cost_sink: C,
        config: &PipelineConfig,
    ) -> ChronicleResult<Self> {
        Ok(Self {
            generator,
            repository,
            cost_sink,
            profile: config.resolve_calls()?,
            sampling: config.sampling,
            pricing: config.pricing.clone(),
            neighborhood: config.neighborhood,
            image_refs: config.image_refs,
            quick_check: config.quick_check,
        })
    }

    /// The text generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The record store.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The cost sink.
    pub fn cost_sink(&self) -> &C {
        &self.cost_sink
    }

    /// Resolved call settings.
    pub fn profile(&self) -> &CallProfile {
        &self.profile
    }

    /// Run one task. Never panics and never returns an error: failures are results.
    #[instrument(
        skip(self, task, abort),
        fields(step = %task.step(), chronicle_id = tracing::field::Empty)
    )]
    pub async fn dispatch(&self, task: &ChronicleTask, abort: &AbortSignal) -> TaskResult {
        match self.run(task, abort).await {
            Ok(output) => {
                info!(
                    actual_cost = output.actual_cost,
                    input_tokens = output.input_tokens,
                    output_tokens = output.output_tokens,
                    "Step completed"
                );
                TaskResult::succeeded(output)
            }
            Err(e) => {
                if e.is_aborted() {
                    info!("Step aborted");
                } else if e.is_precondition() {
                    warn!(error = %e.user_message(), "Step precondition failed");
                } else {
                    error!(error = %e, "Step failed");
                }
                TaskResult::failed(&e)
            }
        }
    }

    /// Parse a wire request and run it.
    pub async fn dispatch_request(&self, request: TaskRequest, abort: &AbortSignal) -> TaskResult {
        match ChronicleTask::try_from(request) {
            Ok(task) => self.dispatch(&task, abort).await,
            Err(e) => {
                warn!(error = %e.user_message(), "Rejected task");
                TaskResult::failed(&e)
            }
        }
    }

    /// Parse a JSON task and run it.
    pub async fn dispatch_json(&self, value: serde_json::Value, abort: &AbortSignal) -> TaskResult {
        match serde_json::from_value::<TaskRequest>(value) {
            Ok(request) => self.dispatch_request(request, abort).await,
            Err(e) => TaskResult::failed(&JsonError::new(format!("Invalid task: {}", e)).into()),
        }
    }

    async fn run(&self, task: &ChronicleTask, abort: &AbortSignal) -> ChronicleResult<StepOutput> {
        let step = *task.step();
        let chronicle_id = match (step, task.chronicle_id()) {
            (_, Some(id)) => id.clone(),
            (Step::GenerateV2, None) => uuid::Uuid::new_v4().to_string(),
            (_, None) => Err(StepError::new(StepErrorKind::MissingChronicleId(step.to_string())))?,
        };
        tracing::Span::current().record("chronicle_id", chronicle_id.as_str());

        let mut recorder = CostRecorder::new(
            &self.generator,
            &self.cost_sink,
            &self.pricing,
            abort,
            chronicle_id.clone(),
            step.to_string(),
        );

        let outcome = match step {
            Step::GenerateV2 => self.generate_v2(task, &mut recorder).await,
            Step::RegenerateTemperature => self.regenerate_temperature(task, &mut recorder).await,
            Step::RegenerateFull => self.regenerate_full(task, &mut recorder).await,
            Step::RegenerateCreative => self.regenerate_creative(task, &mut recorder).await,
            Step::Compare => self.compare(task, &mut recorder).await,
            Step::Combine => self.combine(task, &mut recorder).await,
            Step::CopyEdit => self.copy_edit(task, &mut recorder).await,
            Step::TemporalCheck => self.temporal_check(task, &mut recorder).await,
            Step::QuickCheck => self.quick_check(task, &mut recorder).await,
            Step::Summary => self.summary(task, &mut recorder).await,
            Step::Title => self.title(task, &mut recorder).await,
            Step::ImageRefs => self.image_refs(task, &mut recorder).await,
            Step::CoverImageScene => self.cover_image_scene(task, &mut recorder).await,
            Step::RegenerateSceneDescription => {
                self.regenerate_scene_description(task, &mut recorder).await
            }
            Step::CoverImage => self.cover_image(task).await,
        };

        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                if !e.is_aborted() && !e.is_precondition() {
                    // Calls that completed before the failure were still billed
                    self.accumulate_costs(&chronicle_id, &recorder).await;
                    if step == Step::GenerateV2 {
                        self.mark_shell_failed(&chronicle_id, step, &e).await;
                    }
                }
                return Err(e);
            }
        };

        self.accumulate_costs(&chronicle_id, &recorder).await;

        let totals = recorder.totals();
        Ok(StepOutput {
            chronicle_id,
            generated_at: Utc::now(),
            model: recorder.last_model().map(str::to_string),
            estimated_cost: totals.estimated_cost,
            actual_cost: totals.actual_cost,
            input_tokens: totals.input_tokens,
            output_tokens: totals.output_tokens,
            payload,
        })
    }

    /// Add the step's cost records to the chronicle's running totals.
    async fn accumulate_costs(&self, chronicle_id: &str, recorder: &CostRecorder<'_, G, C>) {
        for record in recorder.records() {
            if let Err(e) = self.repository.add_cost(chronicle_id, record).await {
                warn!(error = %e, cost_id = %record.id, "Failed to accumulate cost on record");
            }
        }
    }

    /// Leave a failure marker on a pending shell after its initial generation failed.
    async fn mark_shell_failed(&self, chronicle_id: &str, step: Step, failure: &ChronicleError) {
        match self.repository.get(chronicle_id).await {
            Ok(Some(record)) if record.versions.is_empty() => {
                let marker = FailureMarker {
                    step: step.to_string(),
                    message: failure.user_message(),
                    failed_at: Utc::now(),
                };
                if let Err(e) = self.repository.mark_failed(chronicle_id, marker).await {
                    warn!(error = %e, "Failed to mark chronicle as failed");
                }
            }
            Ok(_) => debug!("No pending shell to mark failed"),
            Err(e) => warn!(error = %e, "Failed to load chronicle for failure marker"),
        }
    }

    /// Load a record, failing when it does not exist.
    pub(crate) async fn load(&self, chronicle_id: &str) -> ChronicleResult<ChronicleRecord> {
        self.repository
            .get(chronicle_id)
            .await?
            .ok_or_else(|| {
                StepError::new(StepErrorKind::ChronicleNotFound(chronicle_id.to_string())).into()
            })
    }

    /// Load a record for a step, enforcing the acceptance lock.
    pub(crate) async fn load_for(&self, task: &ChronicleTask) -> ChronicleResult<ChronicleRecord> {
        let step = *task.step();
        let chronicle_id = task.chronicle_id().as_deref().ok_or_else(|| {
            ChronicleError::from(StepError::new(StepErrorKind::MissingChronicleId(
                step.to_string(),
            )))
        })?;
        let record = self.load(chronicle_id).await?;
        if record.is_accepted() && !step.allowed_after_acceptance() {
            Err(StepError::new(StepErrorKind::Locked {
                chronicle_id: chronicle_id.to_string(),
                step: step.to_string(),
            }))?
        }
        Ok(record)
    }

    /// Resolved settings for a call type.
    pub(crate) fn call(&self, call_type: CallType) -> &ResolvedCall {
        self.profile.get(call_type)
    }
}

/// A precondition failure.
#[track_caller]
pub(crate) fn precondition(message: impl Into<String>) -> ChronicleError {
    StepError::new(StepErrorKind::Precondition(message.into())).into()
}

/// Require at least `count` versions.
pub(crate) fn require_versions(record: &ChronicleRecord, count: usize) -> ChronicleResult<()> {
    if record.versions.len() < count {
        return Err(precondition(format!(
            "chronicle {} has {} version(s); at least {} required",
            record.id,
            record.versions.len(),
            count
        )));
    }
    Ok(())
}

/// The targeted version, or the active one.
pub(crate) fn require_target<'r>(
    record: &'r ChronicleRecord,
    version_id: Option<&str>,
) -> ChronicleResult<&'r ChronicleVersion> {
    record.target_version(version_id).ok_or_else(|| match version_id {
        Some(id) => precondition(format!("version {} not found on chronicle {}", id, record.id)),
        None => precondition(format!("chronicle {} has no content", record.id)),
    })
}

/// Trimmed response text, failing when nothing came back.
#[track_caller]
pub(crate) fn response_text(response: &GenerateResponse, what: &str) -> ChronicleResult<String> {
    let text = response.text.trim();
    if text.is_empty() {
        return Err(GenerationError::new(GenerationErrorKind::EmptyResponse(what.to_string())).into());
    }
    Ok(text.to_string())
}

/// Payload for a newly appended version.
pub(crate) fn version_payload(version: &ChronicleVersion) -> StepPayload {
    StepPayload::Version {
        version_id: version.id.clone(),
        word_count: version.word_count,
        step: version.step,
    }
}
