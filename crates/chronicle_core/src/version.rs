//! Content versions and the labels that describe how they were produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The step that produced a content version.
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
pub enum VersionStep {
    /// Primary generation
    Generate,
    /// Full or sampling-only regeneration
    Regenerate,
    /// Creative regeneration reusing the perspective brief
    Creative,
    /// Merge of several versions
    Combine,
    /// Copy-edit polish of the active version
    CopyEdit,
}

/// Sampling mode a version was generated under.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SamplingMode {
    /// Default nucleus cutoff
    #[default]
    Normal,
    /// Tightened nucleus cutoff
    Low,
}

/// One immutable entry in a chronicle's version history.
///
/// # Examples
///
/// ```
/// use chronicle_core::{ChronicleVersion, SamplingMode, VersionStep};
///
/// let version = ChronicleVersion::new("The river rose.", VersionStep::Generate, SamplingMode::Normal);
/// assert_eq!(version.word_count, 3);
/// assert!(!version.id.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleVersion {
    /// Unique version id
    pub id: String,
    /// When the content was generated
    pub generated_at: DateTime<Utc>,
    /// Full content
    pub content: String,
    /// Whitespace-delimited word count of `content`
    pub word_count: usize,
    /// Step that produced the content
    pub step: VersionStep,
    /// Sampling mode used
    #[serde(default)]
    pub sampling_mode: SamplingMode,
}

impl ChronicleVersion {
    /// Create a version with a fresh id stamped now.
    pub fn new(content: impl Into<String>, step: VersionStep, sampling_mode: SamplingMode) -> Self {
        let content = content.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            word_count: word_count(&content),
            content,
            step,
            sampling_mode,
        }
    }
}

/// Count whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
