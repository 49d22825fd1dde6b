//! Summary and title enrichment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generated summary of one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Summary text
    pub text: String,
    /// Version the summary was generated from
    pub source_version_id: String,
    /// When it was generated
    pub generated_at: DateTime<Utc>,
}

/// Selected title plus the material it was chosen from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Selected title
    pub title: String,
    /// Ranked, title-cased, deduplicated candidates
    #[serde(default)]
    pub candidates: Vec<String>,
    /// Fragments extracted in the first phase
    #[serde(default)]
    pub fragments: Vec<String>,
    /// Version the title was generated from
    pub source_version_id: String,
    /// When it was generated
    pub generated_at: DateTime<Utc>,
}
