//! Record store and cost sink traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chronicle_core::{
    ChronicleRecord, ChronicleStatus, ComparisonReport, CostRecord, CoverImage, FailureMarker,
    ImageRefsRecord, QuickCheckReport, SummaryRecord, TemporalCheckReport, TitleRecord,
};
use chronicle_error::ChronicleResult;
use serde::{Deserialize, Serialize};

/// Key-value store for chronicle records.
///
/// `put` replaces a whole record. The narrow `update_*` operations touch only
/// their own field and are atomic for it; they fail with a not-found storage
/// error when the record does not exist.
#[async_trait]
pub trait ChronicleRepository: Send + Sync {
    /// Load a record, migrating it to the current schema.
    async fn get(&self, id: &str) -> ChronicleResult<Option<ChronicleRecord>>;

    /// Insert a new record; fails if the id is taken.
    async fn create(&self, record: &ChronicleRecord) -> ChronicleResult<()>;

    /// Insert or replace a record.
    async fn put(&self, record: &ChronicleRecord) -> ChronicleResult<()>;

    /// Remove a record.
    async fn delete(&self, id: &str) -> ChronicleResult<()>;

    /// List summaries matching a filter, newest first.
    async fn list(&self, filter: &RecordFilter) -> ChronicleResult<Vec<ChronicleSummary>>;

    /// Replace the summary.
    async fn update_summary(&self, id: &str, summary: SummaryRecord) -> ChronicleResult<()>;

    /// Replace the title.
    async fn update_title(&self, id: &str, title: TitleRecord) -> ChronicleResult<()>;

    /// Replace the image placements.
    async fn update_image_refs(&self, id: &str, refs: ImageRefsRecord) -> ChronicleResult<()>;

    /// Replace the cover image.
    async fn update_cover_image(&self, id: &str, cover: CoverImage) -> ChronicleResult<()>;

    /// Replace the comparison report.
    async fn update_comparison_report(
        &self,
        id: &str,
        report: ComparisonReport,
    ) -> ChronicleResult<()>;

    /// Replace the temporal check report.
    async fn update_temporal_check(
        &self,
        id: &str,
        report: TemporalCheckReport,
    ) -> ChronicleResult<()>;

    /// Replace the quick check report.
    async fn update_quick_check(&self, id: &str, report: QuickCheckReport) -> ChronicleResult<()>;

    /// Set the failure marker.
    async fn mark_failed(&self, id: &str, failure: FailureMarker) -> ChronicleResult<()>;

    /// Fold a cost record into the record's accumulators.
    async fn add_cost(&self, id: &str, cost: &CostRecord) -> ChronicleResult<()>;
}

/// Append-only sink for cost records.
#[async_trait]
pub trait CostSink: Send + Sync {
    /// Append one record.
    async fn save(&self, record: &CostRecord) -> ChronicleResult<()>;
}

/// Lightweight listing view of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleSummary {
    /// Record id
    pub id: String,
    /// Derived status
    pub status: ChronicleStatus,
    /// Selected title, if any
    pub title: Option<String>,
    /// Style name
    pub style: String,
    /// Number of versions
    pub version_count: usize,
    /// Word count of the current content
    pub word_count: usize,
    /// Total actual cost in dollars
    pub actual_cost: f64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl From<&ChronicleRecord> for ChronicleSummary {
    fn from(record: &ChronicleRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status(),
            title: record.title.as_ref().map(|t| t.title.clone()),
            style: record.context.style.name.clone(),
            version_count: record.versions.len(),
            word_count: record
                .current_content()
                .map(chronicle_core::word_count)
                .unwrap_or(0),
            actual_cost: record.costs.totals.actual_cost,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Filter criteria for listing records.
///
/// All fields are optional; combining several narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Filter by derived status
    pub status: Option<ChronicleStatus>,
    /// Maximum number of results to return
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl RecordFilter {
    /// Create an empty filter (returns all records).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status.
    pub fn with_status(mut self, status: ChronicleStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set pagination limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set pagination offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sort newest first, then apply status, offset and limit.
    pub fn apply(&self, summaries: Vec<ChronicleSummary>) -> Vec<ChronicleSummary> {
        let mut matching: Vec<ChronicleSummary> = summaries
            .into_iter()
            .filter(|s| self.status.is_none_or(|status| s.status == status))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
