//! Task input and result types for the step dispatcher.
//!
//! [`TaskRequest`] is the wire form a caller submits. It converts into a
//! [`ChronicleTask`] whose step is a closed [`Step`] enum, so an unknown step
//! can only be reported while parsing.

use chrono::{DateTime, Utc};
use chronicle_core::{
    ChronicleContext, ComparisonReport, ImageRef, QuickCheckReport, SamplingMode,
    TemporalCheckReport, TemporalContext, VersionStep,
};
use chronicle_error::{ChronicleError, ChronicleResult, StepError, StepErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A dispatchable pipeline step.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    /// Primary generation from a context
    #[serde(rename = "generate_v2")]
    #[strum(serialize = "generate_v2")]
    GenerateV2,
    /// Reuse stored prompts with a different nucleus cutoff
    RegenerateTemperature,
    /// Re-run synthesis and generation
    RegenerateFull,
    /// Reuse the synthesis with looser creative framing
    RegenerateCreative,
    /// Compare versions
    Compare,
    /// Merge versions
    Combine,
    /// Polish the active version
    CopyEdit,
    /// Check temporal alignment
    TemporalCheck,
    /// Check for unanchored names
    QuickCheck,
    /// Summarize
    Summary,
    /// Title
    Title,
    /// Plan image placements
    ImageRefs,
    /// Describe the cover scene
    CoverImageScene,
    /// Rewrite one placement's scene description
    RegenerateSceneDescription,
    /// Compose the cover image prompt
    CoverImage,
}

impl Step {
    /// Whether the step may run on an accepted chronicle.
    pub fn allowed_after_acceptance(&self) -> bool {
        matches!(
            self,
            Step::CoverImageScene | Step::RegenerateSceneDescription | Step::CoverImage
        )
    }
}

/// A task as submitted over the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRequest {
    /// Chronicle id; optional only for the initial generation
    pub chronicle_id: Option<String>,
    /// Step name
    pub step: String,
    /// Generation context for the initial generation
    pub chronicle_context: Option<ChronicleContext>,
    /// Temporal placement
    pub temporal_context: Option<TemporalContext>,
    /// Version targeted by summary, title and image refs
    pub version_id: Option<String>,
    /// Sampling mode for sampling-only regeneration
    pub sampling_mode: Option<SamplingMode>,
    /// Placement targeted by scene-description regeneration
    pub image_ref_id: Option<String>,
}

/// A parsed task ready for dispatch.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ChronicleTask {
    /// Step to run
    step: Step,
    /// Chronicle id
    #[builder(default, setter(into, strip_option))]
    chronicle_id: Option<String>,
    /// Generation context
    #[builder(default, setter(into, strip_option))]
    context: Option<ChronicleContext>,
    /// Temporal placement
    #[builder(default, setter(into, strip_option))]
    temporal_context: Option<TemporalContext>,
    /// Targeted version
    #[builder(default, setter(into, strip_option))]
    version_id: Option<String>,
    /// Sampling mode
    #[builder(default, setter(into, strip_option))]
    sampling_mode: Option<SamplingMode>,
    /// Targeted image placement
    #[builder(default, setter(into, strip_option))]
    image_ref_id: Option<String>,
}

impl ChronicleTask {
    /// Create a new builder.
    pub fn builder() -> ChronicleTaskBuilder {
        ChronicleTaskBuilder::default()
    }

    /// A task for a step on an existing chronicle.
    pub fn for_chronicle(step: Step, chronicle_id: impl Into<String>) -> Self {
        Self {
            step,
            chronicle_id: Some(chronicle_id.into()),
            context: None,
            temporal_context: None,
            version_id: None,
            sampling_mode: None,
            image_ref_id: None,
        }
    }
}

impl TryFrom<TaskRequest> for ChronicleTask {
    type Error = ChronicleError;

    fn try_from(request: TaskRequest) -> ChronicleResult<Self> {
        let step = Step::from_str(request.step.trim())
            .map_err(|_| StepError::new(StepErrorKind::UnknownStep(request.step.clone())))?;
        Ok(Self {
            step,
            chronicle_id: request.chronicle_id,
            context: request.chronicle_context,
            temporal_context: request.temporal_context,
            version_id: request.version_id,
            sampling_mode: request.sampling_mode,
            image_ref_id: request.image_ref_id,
        })
    }
}

/// Step-specific part of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "payloadType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum StepPayload {
    /// A new version was appended
    Version {
        /// New version id
        version_id: String,
        /// Its word count
        word_count: usize,
        /// Producing step
        step: VersionStep,
    },
    /// Comparison report
    Comparison {
        /// The report
        report: ComparisonReport,
    },
    /// Temporal alignment report
    TemporalCheck {
        /// The report
        report: TemporalCheckReport,
    },
    /// Unanchored reference report
    QuickCheck {
        /// The report
        report: QuickCheckReport,
    },
    /// Summary text
    Summary {
        /// Summary
        summary: String,
        /// Version summarized
        version_id: String,
    },
    /// Title and candidates
    Title {
        /// Selected title
        title: String,
        /// Ranked candidates
        candidates: Vec<String>,
        /// Phase-one fragments
        fragments: Vec<String>,
    },
    /// Image placements
    ImageRefs {
        /// Placements
        refs: Vec<ImageRef>,
    },
    /// Scene description for the cover or one placement
    SceneDescription {
        /// Description
        scene_description: String,
        /// Placement rewritten, absent for the cover
        image_ref_id: Option<String>,
    },
    /// Final cover image prompt
    ImagePrompt {
        /// Prompt
        prompt: String,
    },
}

/// Successful step output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutput {
    /// Chronicle id
    pub chronicle_id: String,
    /// When the step finished
    pub generated_at: DateTime<Utc>,
    /// Model of the last external call, absent when none was made
    pub model: Option<String>,
    /// Estimated dollar cost of the step
    pub estimated_cost: f64,
    /// Actual dollar cost of the step
    pub actual_cost: f64,
    /// Input tokens used
    pub input_tokens: u64,
    /// Output tokens used
    pub output_tokens: u64,
    /// Step-specific payload
    #[serde(flatten)]
    pub payload: StepPayload,
}

/// Outcome of one dispatch. Failures are values, never panics or escaping errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Whether the step succeeded
    pub success: bool,
    /// Output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepOutput>,
    /// Error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnostic payload for parse failures and aborts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl TaskResult {
    /// A successful result.
    pub fn succeeded(output: StepOutput) -> Self {
        Self {
            success: true,
            result: Some(output),
            error: None,
            debug: None,
        }
    }

    /// A failed result carrying the error's user-facing message.
    pub fn failed(error: &ChronicleError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.user_message()),
            debug: error.debug_payload().map(str::to_string),
        }
    }

    /// The payload, if the step succeeded.
    pub fn payload(&self) -> Option<&StepPayload> {
        self.result.as_ref().map(|r| &r.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_round_trip() {
        use strum::IntoEnumIterator;
        for step in Step::iter() {
            assert_eq!(Step::from_str(&step.to_string()).unwrap(), step);
        }
        assert_eq!(Step::GenerateV2.to_string(), "generate_v2");
        assert_eq!(
            Step::RegenerateSceneDescription.to_string(),
            "regenerate_scene_description"
        );
    }

    #[test]
    fn unknown_step_fails_to_parse() {
        let request = TaskRequest {
            chronicle_id: Some("chr-1".into()),
            step: "summon_dragon".into(),
            ..Default::default()
        };
        let err = ChronicleTask::try_from(request).unwrap_err();
        assert_eq!(err.user_message(), "Unknown step: summon_dragon");
    }

    #[test]
    fn request_uses_camel_case() {
        let json = serde_json::json!({
            "chronicleId": "chr-1",
            "step": "regenerate_temperature",
            "samplingMode": "low",
        });
        let request: TaskRequest = serde_json::from_value(json).unwrap();
        let task = ChronicleTask::try_from(request).unwrap();
        assert_eq!(*task.step(), Step::RegenerateTemperature);
        assert_eq!(*task.sampling_mode(), Some(SamplingMode::Low));
    }

    #[test]
    fn output_flattens_payload() {
        let output = StepOutput {
            chronicle_id: "chr-1".into(),
            generated_at: Utc::now(),
            model: Some("claude-sonnet-4-5".into()),
            estimated_cost: 0.01,
            actual_cost: 0.02,
            input_tokens: 100,
            output_tokens: 50,
            payload: StepPayload::Summary {
                summary: "Ships burn.".into(),
                version_id: "v1".into(),
            },
        };
        let value = serde_json::to_value(TaskResult::succeeded(output)).unwrap();
        assert_eq!(value["result"]["payloadType"], "summary");
        assert_eq!(value["result"]["summary"], "Ships burn.");
        assert_eq!(value["result"]["versionId"], "v1");
        assert_eq!(value["result"]["inputTokens"], 100);
        assert!(value.get("error").is_none());
    }
}
