//! The chronicle record: one versioned schema holding a chronicle's whole state.
//!
//! Every field added after the first schema is optional and defaults when
//! absent, so older records always deserialize. [`ChronicleRecord::migrate`]
//! then upgrades them in place; stores call it on every load.

use crate::{
    ChronicleContext, ChronicleVersion, ComparisonReport, CostAccumulator, CoverImage,
    ImageRefsRecord, PerspectiveRecord, QuickCheckReport, SamplingMode, SummaryRecord,
    TemporalCheckReport, TemporalContext, TitleRecord, VersionStep,
};
use chrono::{DateTime, Utc};
use chronicle_error::{StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Lifecycle status, always derived from record contents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChronicleStatus {
    /// Shell exists, nothing requested
    NotStarted,
    /// Initial generation requested, no content yet
    Generating,
    /// A single generated draft exists
    AssemblyReady,
    /// Several drafts exist or the draft has been edited
    Editing,
    /// The active draft has a consistency report
    Validating,
    /// The initial generation failed
    Failed,
    /// Accepted
    Complete,
}

/// Literal prompts of the last primary generation, kept for sampling-only regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrompts {
    /// System prompt
    pub system: String,
    /// User prompt
    pub user: String,
}

/// Marker left on a shell whose initial generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMarker {
    /// Step that failed
    pub step: String,
    /// Failure message
    pub message: String,
    /// When it failed
    pub failed_at: DateTime<Utc>,
}

/// Lightweight view of one version for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    /// Version id
    pub id: String,
    /// Producing step
    pub step: VersionStep,
    /// Sampling mode
    pub sampling_mode: SamplingMode,
    /// Word count
    pub word_count: usize,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Whether this is the active version
    pub is_active: bool,
}

/// A chronicle and its full editorial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleRecord {
    /// Stable id
    pub id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Schema version; absent on records written before versioning
    #[serde(default)]
    pub schema_version: u32,
    /// Generation context captured at creation
    #[serde(default)]
    pub context: ChronicleContext,
    /// Temporal placement
    #[serde(default)]
    pub temporal_context: Option<TemporalContext>,
    /// Current draft, mirrors the active version
    #[serde(default)]
    pub assembled_content: Option<String>,
    /// Accepted content; immutable once set
    #[serde(default)]
    pub final_content: Option<String>,
    /// When the chronicle was accepted
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    /// Active version pointer
    #[serde(default)]
    pub active_version_id: Option<String>,
    /// Every version, oldest first, the active one included
    #[serde(default)]
    pub versions: Vec<ChronicleVersion>,
    /// Prompts of the last primary generation
    #[serde(default)]
    pub prompts: Option<StoredPrompts>,
    /// Latest perspective synthesis
    #[serde(default)]
    pub perspective: Option<PerspectiveRecord>,
    /// Summary
    #[serde(default)]
    pub summary: Option<SummaryRecord>,
    /// Title
    #[serde(default)]
    pub title: Option<TitleRecord>,
    /// Image placements
    #[serde(default)]
    pub image_refs: Option<ImageRefsRecord>,
    /// Cover image
    #[serde(default)]
    pub cover_image: Option<CoverImage>,
    /// Last comparison report
    #[serde(default)]
    pub comparison_report: Option<ComparisonReport>,
    /// Last temporal check
    #[serde(default)]
    pub temporal_check: Option<TemporalCheckReport>,
    /// Last quick check
    #[serde(default)]
    pub quick_check: Option<QuickCheckReport>,
    /// Set when the initial generation failed
    #[serde(default)]
    pub failure: Option<FailureMarker>,
    /// When the initial generation was requested
    #[serde(default)]
    pub generation_requested_at: Option<DateTime<Utc>>,
    /// Cost totals
    #[serde(default)]
    pub costs: CostAccumulator,
}

impl ChronicleRecord {
    /// Create an empty record for a context.
    pub fn new(
        id: impl Into<String>,
        context: ChronicleContext,
        temporal_context: Option<TemporalContext>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
            context,
            temporal_context,
            assembled_content: None,
            final_content: None,
            accepted_at: None,
            active_version_id: None,
            versions: Vec::new(),
            prompts: None,
            perspective: None,
            summary: None,
            title: None,
            image_refs: None,
            cover_image: None,
            comparison_report: None,
            temporal_check: None,
            quick_check: None,
            failure: None,
            generation_requested_at: None,
            costs: CostAccumulator::default(),
        }
    }

    /// Derive the lifecycle status.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle_core::{ChronicleContext, ChronicleRecord, ChronicleStatus, ChronicleVersion, SamplingMode, VersionStep};
    ///
    /// let mut record = ChronicleRecord::new("chr-1", ChronicleContext::default(), None);
    /// assert_eq!(record.status(), ChronicleStatus::NotStarted);
    ///
    /// record.push_version(ChronicleVersion::new("Draft.", VersionStep::Generate, SamplingMode::Normal));
    /// assert_eq!(record.status(), ChronicleStatus::AssemblyReady);
    ///
    /// record.push_version(ChronicleVersion::new("Second draft.", VersionStep::Regenerate, SamplingMode::Low));
    /// assert_eq!(record.status(), ChronicleStatus::Editing);
    /// ```
    pub fn status(&self) -> ChronicleStatus {
        if self.final_content.is_some() {
            return ChronicleStatus::Complete;
        }
        if self.failure.is_some() {
            return ChronicleStatus::Failed;
        }
        let Some(active) = self.active_version() else {
            return if self.generation_requested_at.is_some() {
                ChronicleStatus::Generating
            } else {
                ChronicleStatus::NotStarted
            };
        };
        let checked = self
            .temporal_check
            .as_ref()
            .is_some_and(|r| r.version_id == active.id)
            || self
                .quick_check
                .as_ref()
                .is_some_and(|r| r.version_id == active.id);
        if checked {
            return ChronicleStatus::Validating;
        }
        let edited = matches!(active.step, VersionStep::Combine | VersionStep::CopyEdit);
        if edited || self.versions.len() > 1 {
            ChronicleStatus::Editing
        } else {
            ChronicleStatus::AssemblyReady
        }
    }

    /// Whether the chronicle has been accepted.
    pub fn is_accepted(&self) -> bool {
        self.final_content.is_some()
    }

    /// The active version.
    pub fn active_version(&self) -> Option<&ChronicleVersion> {
        let id = self.active_version_id.as_deref()?;
        self.version(id)
    }

    /// Look up a version by id.
    pub fn version(&self, version_id: &str) -> Option<&ChronicleVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    /// The targeted version, or the active one when no id is given.
    pub fn target_version(&self, version_id: Option<&str>) -> Option<&ChronicleVersion> {
        match version_id {
            Some(id) => self.version(id),
            None => self.active_version(),
        }
    }

    /// Content downstream steps operate on: final when accepted, else the active draft.
    pub fn current_content(&self) -> Option<&str> {
        self.final_content
            .as_deref()
            .or_else(|| self.active_version().map(|v| v.content.as_str()))
            .or(self.assembled_content.as_deref())
    }

    /// Append a version and make it active.
    ///
    /// Clears any failure marker, since content now exists.
    pub fn push_version(&mut self, version: ChronicleVersion) {
        self.assembled_content = Some(version.content.clone());
        self.active_version_id = Some(version.id.clone());
        self.versions.push(version);
        self.failure = None;
        self.touch();
    }

    /// Point the active pointer at an existing version.
    pub fn set_active_version(&mut self, version_id: &str) -> Result<(), StorageError> {
        let content = self
            .version(version_id)
            .map(|v| v.content.clone())
            .ok_or_else(|| self.version_not_found(version_id))?;
        self.active_version_id = Some(version_id.to_string());
        self.assembled_content = Some(content);
        self.touch();
        Ok(())
    }

    /// Delete one version.
    ///
    /// The last remaining version cannot be deleted. Deleting the active
    /// version moves the pointer to the newest remaining one.
    pub fn remove_version(&mut self, version_id: &str) -> Result<ChronicleVersion, StorageError> {
        let index = self
            .versions
            .iter()
            .position(|v| v.id == version_id)
            .ok_or_else(|| self.version_not_found(version_id))?;
        if self.versions.len() == 1 {
            return Err(StorageError::new(StorageErrorKind::InvalidState(format!(
                "cannot delete the only version of chronicle {}",
                self.id
            ))));
        }
        let removed = self.versions.remove(index);
        if self.active_version_id.as_deref() == Some(version_id) {
            let newest = self
                .versions
                .iter()
                .max_by_key(|v| v.generated_at)
                .map(|v| (v.id.clone(), v.content.clone()));
            if let Some((id, content)) = newest {
                self.active_version_id = Some(id);
                self.assembled_content = Some(content);
            }
        }
        self.touch();
        Ok(removed)
    }

    /// Listing view of every version.
    pub fn version_summaries(&self) -> Vec<VersionSummary> {
        let active = self.active_version_id.as_deref();
        self.versions
            .iter()
            .map(|v| VersionSummary {
                id: v.id.clone(),
                step: v.step,
                sampling_mode: v.sampling_mode,
                word_count: v.word_count,
                generated_at: v.generated_at,
                is_active: Some(v.id.as_str()) == active,
            })
            .collect()
    }

    /// Upgrade an older record in place. Returns whether anything changed.
    ///
    /// Version 0 records carry content but no history; a `generate` version
    /// is synthesized from that content and made active.
    pub fn migrate(&mut self) -> bool {
        let mut changed = false;
        if self.schema_version < 1 {
            if self.versions.is_empty() {
                let legacy = self
                    .assembled_content
                    .clone()
                    .or_else(|| self.final_content.clone());
                if let Some(content) = legacy {
                    let mut version =
                        ChronicleVersion::new(content, VersionStep::Generate, SamplingMode::Normal);
                    version.generated_at = self.created_at;
                    self.active_version_id = Some(version.id.clone());
                    self.assembled_content = Some(version.content.clone());
                    self.versions.push(version);
                }
            }
            self.schema_version = 1;
            changed = true;
        }
        if self.active_version_id.is_none()
            && let Some(last) = self.versions.last()
        {
            self.active_version_id = Some(last.id.clone());
            self.assembled_content = Some(last.content.clone());
            changed = true;
        }
        changed
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    #[track_caller]
    fn version_not_found(&self, version_id: &str) -> StorageError {
        StorageError::new(StorageErrorKind::VersionNotFound {
            chronicle_id: self.id.clone(),
            version_id: version_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QuickCheckAssessment, QuickCheckReport};

    fn record_with(versions: &[(&str, VersionStep)]) -> ChronicleRecord {
        let mut record = ChronicleRecord::new("chr-test", ChronicleContext::default(), None);
        for (content, step) in versions {
            record.push_version(ChronicleVersion::new(*content, *step, SamplingMode::Normal));
        }
        record
    }

    #[test]
    fn push_version_mirrors_active_content() {
        let record = record_with(&[("one", VersionStep::Generate), ("two", VersionStep::Regenerate)]);
        assert_eq!(record.versions.len(), 2);
        assert_eq!(record.assembled_content.as_deref(), Some("two"));
        assert_eq!(record.active_version().map(|v| v.content.as_str()), Some("two"));
    }

    #[test]
    fn status_progression() {
        let mut record = ChronicleRecord::new("chr", ChronicleContext::default(), None);
        record.generation_requested_at = Some(Utc::now());
        assert_eq!(record.status(), ChronicleStatus::Generating);

        record.failure = Some(FailureMarker {
            step: "generate_v2".into(),
            message: "boom".into(),
            failed_at: Utc::now(),
        });
        assert_eq!(record.status(), ChronicleStatus::Failed);

        record.push_version(ChronicleVersion::new("text", VersionStep::Generate, SamplingMode::Normal));
        assert_eq!(record.status(), ChronicleStatus::AssemblyReady);

        let active = record.active_version_id.clone().unwrap_or_default();
        record.quick_check = Some(QuickCheckReport {
            suspects: vec![],
            assessment: QuickCheckAssessment::Clean,
            version_id: active,
            generated_at: Utc::now(),
        });
        assert_eq!(record.status(), ChronicleStatus::Validating);

        record.final_content = Some("text".into());
        assert_eq!(record.status(), ChronicleStatus::Complete);
    }

    #[test]
    fn copy_edit_alone_counts_as_editing() {
        let mut record = record_with(&[("one", VersionStep::Generate)]);
        let first = record.versions[0].id.clone();
        record.push_version(ChronicleVersion::new("polished", VersionStep::CopyEdit, SamplingMode::Normal));
        record.remove_version(&first).unwrap();
        assert_eq!(record.versions.len(), 1);
        assert_eq!(record.status(), ChronicleStatus::Editing);
    }

    #[test]
    fn removing_active_reassigns_to_newest() {
        let mut record = record_with(&[
            ("one", VersionStep::Generate),
            ("two", VersionStep::Regenerate),
            ("three", VersionStep::Combine),
        ]);
        let active = record.active_version_id.clone().unwrap();
        record.remove_version(&active).unwrap();
        assert_eq!(record.assembled_content.as_deref(), Some("two"));
    }

    #[test]
    fn last_version_cannot_be_removed() {
        let mut record = record_with(&[("only", VersionStep::Generate)]);
        let id = record.versions[0].id.clone();
        let err = record.remove_version(&id).unwrap_err();
        assert!(matches!(err.kind, StorageErrorKind::InvalidState(_)));
        assert_eq!(record.versions.len(), 1);
    }

    #[test]
    fn set_active_rejects_unknown_version() {
        let mut record = record_with(&[("only", VersionStep::Generate)]);
        let err = record.set_active_version("missing").unwrap_err();
        assert!(matches!(err.kind, StorageErrorKind::VersionNotFound { .. }));
    }

    #[test]
    fn migrate_synthesizes_history_for_legacy_records() {
        let legacy = serde_json::json!({
            "id": "chr-legacy",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "assembled_content": "Old words here."
        });
        let mut record: ChronicleRecord = serde_json::from_value(legacy).unwrap();
        assert_eq!(record.schema_version, 0);
        assert!(record.migrate());
        assert_eq!(record.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(record.versions.len(), 1);
        assert_eq!(record.versions[0].step, VersionStep::Generate);
        assert_eq!(record.versions[0].word_count, 3);
        assert_eq!(record.active_version().map(|v| v.content.as_str()), Some("Old words here."));
        assert!(!record.migrate());
    }
}
