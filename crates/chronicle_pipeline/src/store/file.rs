//! File-backed record store and JSONL cost ledger.
//!
//! Layout under the base directory:
//!
//! ```text
//! {base}/
//! ├── chronicles/
//! │   ├── chr-1.json
//! │   └── chr-2.json
//! └── costs.jsonl
//! ```
//!
//! Records are written to a temp file and renamed into place.

use super::{migrated, not_found};
use async_trait::async_trait;
use chronicle_core::{
    ChronicleRecord, ComparisonReport, CostRecord, CoverImage, FailureMarker, ImageRefsRecord,
    QuickCheckReport, SummaryRecord, TemporalCheckReport, TitleRecord,
};
use chronicle_error::{ChronicleError, ChronicleResult, StorageError, StorageErrorKind};
use chronicle_interface::{ChronicleRepository, ChronicleSummary, CostSink, RecordFilter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::Io(format!(
        "{} {}: {}",
        action,
        path.display(),
        e
    )))
}

fn serialization_error(path: &Path, e: serde_json::Error) -> StorageError {
    StorageError::new(StorageErrorKind::Serialization(format!(
        "{}: {}",
        path.display(),
        e
    )))
}

/// One JSON file per chronicle.
#[derive(Debug)]
pub struct FileChronicleRepository {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileChronicleRepository {
    /// Open a store under `base_path`, creating directories as needed.
    #[instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> ChronicleResult<Self> {
        let dir = base_path.into().join("chronicles");
        std::fs::create_dir_all(&dir).map_err(|e| io_error("create", &dir, e))?;
        tracing::info!(path = %dir.display(), "Opened chronicle store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &str) -> ChronicleResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            Err(StorageError::new(StorageErrorKind::InvalidState(format!(
                "invalid chronicle id '{}'",
                id
            ))))?
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read(&self, path: &Path) -> ChronicleResult<Option<ChronicleRecord>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(io_error("read", path, e))?,
        };
        let record: ChronicleRecord =
            serde_json::from_slice(&bytes).map_err(|e| serialization_error(path, e))?;
        Ok(Some(migrated(record)))
    }

    async fn write(&self, path: &Path, record: &ChronicleRecord) -> ChronicleResult<()> {
        let json = serde_json::to_vec_pretty(record).map_err(|e| serialization_error(path, e))?;
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| io_error("write", &temp_path, e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| io_error("rename", &temp_path, e))?;
        debug!(path = %path.display(), "Wrote chronicle record");
        Ok(())
    }

    async fn update<F>(&self, id: &str, apply: F) -> ChronicleResult<()>
    where
        F: FnOnce(&mut ChronicleRecord) + Send,
    {
        let path = self.path_for(id)?;
        let _guard = self.write_lock.lock().await;
        let mut record = self.read(&path).await?.ok_or_else(|| not_found(id))?;
        apply(&mut record);
        record.touch();
        self.write(&path, &record).await
    }
}

#[async_trait]
impl ChronicleRepository for FileChronicleRepository {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> ChronicleResult<Option<ChronicleRecord>> {
        let path = self.path_for(id)?;
        self.read(&path).await
    }

    #[instrument(skip(self, record), fields(chronicle_id = %record.id))]
    async fn create(&self, record: &ChronicleRecord) -> ChronicleResult<()> {
        let path = self.path_for(&record.id)?;
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Err(StorageError::new(StorageErrorKind::AlreadyExists(format!(
                "chronicle {}",
                record.id
            ))))?
        }
        self.write(&path, record).await
    }

    #[instrument(skip(self, record), fields(chronicle_id = %record.id))]
    async fn put(&self, record: &ChronicleRecord) -> ChronicleResult<()> {
        let path = self.path_for(&record.id)?;
        let _guard = self.write_lock.lock().await;
        self.write(&path, record).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ChronicleResult<()> {
        let path = self.path_for(id)?;
        let _guard = self.write_lock.lock().await;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(id)
            } else {
                io_error("remove", &path, e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &RecordFilter) -> ChronicleResult<Vec<ChronicleSummary>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error("list", &self.dir, e))?;
        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("list", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path).await {
                Ok(Some(record)) => summaries.push(ChronicleSummary::from(&record)),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
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

/// Append-only JSON-lines cost ledger.
#[derive(Debug)]
pub struct JsonlCostSink {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonlCostSink {
    /// Ledger at `{base_path}/costs.jsonl`.
    pub fn new(base_path: impl AsRef<Path>) -> ChronicleResult<Self> {
        let base = base_path.as_ref();
        std::fs::create_dir_all(base).map_err(|e| io_error("create", base, e))?;
        Ok(Self {
            path: base.join("costs.jsonl"),
            append_lock: Mutex::new(()),
        })
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every ledger entry.
    pub async fn read_all(&self) -> ChronicleResult<Vec<CostRecord>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => Err(io_error("read", &self.path, e))?,
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str::<CostRecord>(line)
                    .map_err(|e| ChronicleError::from(serialization_error(&self.path, e)))
            })
            .collect()
    }
}

#[async_trait]
impl CostSink for JsonlCostSink {
    #[instrument(skip(self, record), fields(chronicle_id = %record.chronicle_id, call_type = %record.call_type))]
    async fn save(&self, record: &CostRecord) -> ChronicleResult<()> {
        let mut line = serde_json::to_string(record).map_err(|e| serialization_error(&self.path, e))?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error("open", &self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error("append", &self.path, e))?;
        file.flush()
            .await
            .map_err(|e| io_error("flush", &self.path, e))?;
        Ok(())
    }
}
