//! In-memory record store and cost sink.

use super::{migrated, not_found};
use async_trait::async_trait;
use chronicle_core::{
    ChronicleRecord, ComparisonReport, CostRecord, CoverImage, FailureMarker, ImageRefsRecord,
    QuickCheckReport, SummaryRecord, TemporalCheckReport, TitleRecord,
};
use chronicle_error::{ChronicleResult, StorageError, StorageErrorKind};
use chronicle_interface::{ChronicleRepository, ChronicleSummary, CostSink, RecordFilter};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Record store backed by a map behind an async lock.
///
/// # Examples
///
/// ```
/// use chronicle_core::{ChronicleContext, ChronicleRecord};
/// use chronicle_interface::ChronicleRepository;
/// use chronicle_pipeline::InMemoryChronicleRepository;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let repository = InMemoryChronicleRepository::new();
/// let record = ChronicleRecord::new("chr-1", ChronicleContext::default(), None);
/// repository.create(&record).await.unwrap();
/// assert!(repository.get("chr-1").await.unwrap().is_some());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryChronicleRepository {
    records: RwLock<HashMap<String, ChronicleRecord>>,
}

impl InMemoryChronicleRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn update<F>(&self, id: &str, apply: F) -> ChronicleResult<()>
    where
        F: FnOnce(&mut ChronicleRecord) + Send,
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| not_found(id))?;
        apply(record);
        record.touch();
        Ok(())
    }
}

#[async_trait]
impl ChronicleRepository for InMemoryChronicleRepository {
    async fn get(&self, id: &str) -> ChronicleResult<Option<ChronicleRecord>> {
        Ok(self.records.read().await.get(id).cloned().map(migrated))
    }

    async fn create(&self, record: &ChronicleRecord) -> ChronicleResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            Err(StorageError::new(StorageErrorKind::AlreadyExists(format!(
                "chronicle {}",
                record.id
            ))))?
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn put(&self, record: &ChronicleRecord) -> ChronicleResult<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> ChronicleResult<()> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id).into())
    }

    async fn list(&self, filter: &RecordFilter) -> ChronicleResult<Vec<ChronicleSummary>> {
        let summaries = self
            .records
            .read()
            .await
            .values()
            .map(ChronicleSummary::from)
            .collect();
        Ok(filter.apply(summaries))
    }

    async fn update_summary(&self, id: &str, summary: SummaryRecord) -> ChronicleResult<()> {
        self.update(id, |r| r.summary = Some(summary)).await
    }

    async fn update_title(&self, id: &str, title: TitleRecord) -> ChronicleResult<()> {
        self.update(id, |r| r.title = Some(title)).await
    }

    async fn update_image_refs(&self, id: &str, refs: ImageRefsRecord) -> ChronicleResult<()> {
        self.update(id, |r| r.image_refs = Some(refs)).await
    }

    async fn update_cover_image(&self, id: &str, cover: CoverImage) -> ChronicleResult<()> {
        self.update(id, |r| r.cover_image = Some(cover)).await
    }

    async fn update_comparison_report(
        &self,
        id: &str,
        report: ComparisonReport,
    ) -> ChronicleResult<()> {
        self.update(id, |r| r.comparison_report = Some(report)).await
    }

    async fn update_temporal_check(
        &self,
        id: &str,
        report: TemporalCheckReport,
    ) -> ChronicleResult<()> {
        self.update(id, |r| r.temporal_check = Some(report)).await
    }

    async fn update_quick_check(&self, id: &str, report: QuickCheckReport) -> ChronicleResult<()> {
        self.update(id, |r| r.quick_check = Some(report)).await
    }

    async fn mark_failed(&self, id: &str, failure: FailureMarker) -> ChronicleResult<()> {
        self.update(id, |r| r.failure = Some(failure)).await
    }

    async fn add_cost(&self, id: &str, cost: &CostRecord) -> ChronicleResult<()> {
        self.update(id, |r| r.costs.add(cost)).await
    }
}

/// Cost sink that keeps records in memory.
#[derive(Debug, Default)]
pub struct InMemoryCostSink {
    records: RwLock<Vec<CostRecord>>,
}

impl InMemoryCostSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record saved so far.
    pub async fn records(&self) -> Vec<CostRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl CostSink for InMemoryCostSink {
    async fn save(&self, record: &CostRecord) -> ChronicleResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
