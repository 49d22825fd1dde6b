//! Analysis and consistency reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// LLM-judged comparison across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Full report text
    pub text: String,
    /// Editorial directive extracted from the report
    #[serde(default)]
    pub combine_instructions: Option<String>,
    /// Versions that were compared, in label order
    #[serde(default)]
    pub version_ids: Vec<String>,
    /// When the comparison ran
    pub generated_at: DateTime<Utc>,
}

/// Ordinal scale for how well content fits its temporal context.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TemporalAlignment {
    /// Content contradicts the period
    Misaligned,
    /// Content barely reflects the period
    Weak,
    /// Content reflects the period with minor slips
    Adequate,
    /// Content is firmly anchored in the period
    Strong,
}

/// Temporal alignment check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalCheckReport {
    /// Overall alignment
    pub alignment: TemporalAlignment,
    /// Specific issues found
    #[serde(default)]
    pub issues: Vec<String>,
    /// Narrative assessment
    #[serde(default)]
    pub summary: String,
    /// Version that was checked
    pub version_id: String,
    /// When the check ran
    pub generated_at: DateTime<Utc>,
}

/// Confidence attached to a quick-check suspect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuspectConfidence {
    /// Probably benign
    Low,
    /// Worth a look
    Medium,
    /// Almost certainly an invented name
    High,
}

/// A phrase that looks like an unanchored proper noun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspect {
    /// Offending phrase
    pub phrase: String,
    /// Surrounding text
    #[serde(default)]
    pub context: String,
    /// Confidence level
    pub confidence: SuspectConfidence,
    /// Why it was flagged
    #[serde(default)]
    pub reason: String,
}

/// Overall verdict of a quick check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QuickCheckAssessment {
    /// Nothing suspicious
    Clean,
    /// A few low-confidence suspects
    Minor,
    /// Needs review
    Flagged,
}

/// Unanchored-reference check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickCheckReport {
    /// Suspects, highest confidence first
    #[serde(default)]
    pub suspects: Vec<Suspect>,
    /// Verdict
    pub assessment: QuickCheckAssessment,
    /// Version that was checked
    pub version_id: String,
    /// When the check ran
    pub generated_at: DateTime<Utc>,
}
