//! User-triggered lifecycle operations outside the step dispatcher.

use crate::dispatcher::precondition;
use chrono::Utc;
use chronicle_core::{ChronicleContext, ChronicleRecord, ImageStatus, TemporalContext};
use chronicle_error::{
    ChronicleError, ChronicleResult, StepError, StepErrorKind, StorageError, StorageErrorKind,
};
use chronicle_interface::ChronicleRepository;
use tracing::{info, instrument};

/// Lifecycle operations over a record store.
///
/// # Example
///
/// ```rust,ignore
/// let lifecycle = ChronicleLifecycle::new(dispatcher.repository());
/// let shell = lifecycle.submit_generation(context, None, None).await?;
/// // ... dispatch generate_v2 for shell.id ...
/// lifecycle.accept(&shell.id).await?;
/// ```
pub struct ChronicleLifecycle<'a, R> {
    repository: &'a R,
}

impl<'a, R: ChronicleRepository> ChronicleLifecycle<'a, R> {
    /// Wrap a record store.
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    async fn load(&self, id: &str) -> ChronicleResult<ChronicleRecord> {
        self.repository.get(id).await?.ok_or_else(|| {
            ChronicleError::from(StepError::new(StepErrorKind::ChronicleNotFound(id.to_string())))
        })
    }

    async fn load_unlocked(&self, id: &str, operation: &str) -> ChronicleResult<ChronicleRecord> {
        let record = self.load(id).await?;
        if record.is_accepted() {
            Err(StepError::new(StepErrorKind::Locked {
                chronicle_id: id.to_string(),
                step: operation.to_string(),
            }))?
        }
        Ok(record)
    }

    /// Create the pending shell a primary generation runs against.
    #[instrument(skip(self, context, temporal_context))]
    pub async fn submit_generation(
        &self,
        context: ChronicleContext,
        temporal_context: Option<TemporalContext>,
        id: Option<String>,
    ) -> ChronicleResult<ChronicleRecord> {
        if context.role_assignments.is_empty() {
            return Err(precondition("a generation context needs at least one cast member"));
        }
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut record = ChronicleRecord::new(id, context, temporal_context);
        record.generation_requested_at = Some(Utc::now());
        self.repository.create(&record).await?;
        info!(chronicle_id = %record.id, "Generation submitted");
        Ok(record)
    }

    /// Lock the active version in as the final content.
    #[instrument(skip(self))]
    pub async fn accept(&self, id: &str) -> ChronicleResult<ChronicleRecord> {
        let mut record = self.load_unlocked(id, "accept").await?;
        let Some(content) = record.active_version().map(|v| v.content.clone()) else {
            return Err(precondition(format!("chronicle {} has no content to accept", id)));
        };
        record.final_content = Some(content);
        record.accepted_at = Some(Utc::now());
        record.touch();
        self.repository.put(&record).await?;
        info!(chronicle_id = %id, "Chronicle accepted");
        Ok(record)
    }

    /// Clear the final content, returning the chronicle to draft.
    #[instrument(skip(self))]
    pub async fn unpublish(&self, id: &str) -> ChronicleResult<ChronicleRecord> {
        let mut record = self.load(id).await?;
        if !record.is_accepted() {
            return Err(precondition(format!("chronicle {} is not accepted", id)));
        }
        record.final_content = None;
        record.accepted_at = None;
        record.touch();
        self.repository.put(&record).await?;
        info!(chronicle_id = %id, "Chronicle unpublished");
        Ok(record)
    }

    /// Delete the chronicle and recreate a pending shell with the same id and inputs.
    #[instrument(skip(self))]
    pub async fn restart(&self, id: &str) -> ChronicleResult<ChronicleRecord> {
        let old = self.load(id).await?;
        self.repository.delete(id).await?;
        let mut record = ChronicleRecord::new(id, old.context, old.temporal_context);
        record.generation_requested_at = Some(Utc::now());
        self.repository.create(&record).await?;
        info!(chronicle_id = %id, "Chronicle restarted");
        Ok(record)
    }

    /// Delete one version. The last remaining version cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_version(
        &self,
        id: &str,
        version_id: &str,
    ) -> ChronicleResult<ChronicleRecord> {
        let mut record = self.load_unlocked(id, "delete_version").await?;
        record.remove_version(version_id)?;
        self.repository.put(&record).await?;
        info!(chronicle_id = %id, version_id, remaining = record.versions.len(), "Version deleted");
        Ok(record)
    }

    /// Point the active pointer at another version.
    #[instrument(skip(self))]
    pub async fn set_active_version(
        &self,
        id: &str,
        version_id: &str,
    ) -> ChronicleResult<ChronicleRecord> {
        let mut record = self.load_unlocked(id, "set_active_version").await?;
        record.set_active_version(version_id)?;
        self.repository.put(&record).await?;
        info!(chronicle_id = %id, version_id, "Active version changed");
        Ok(record)
    }

    /// Replace the temporal context.
    #[instrument(skip(self, temporal_context))]
    pub async fn update_temporal_context(
        &self,
        id: &str,
        temporal_context: TemporalContext,
    ) -> ChronicleResult<ChronicleRecord> {
        let mut record = self.load_unlocked(id, "update_temporal_context").await?;
        record.temporal_context = Some(temporal_context);
        record.touch();
        self.repository.put(&record).await?;
        Ok(record)
    }

    /// Record the outcome of external image generation for one placement.
    ///
    /// Allowed after acceptance.
    #[instrument(skip(self, error))]
    pub async fn update_image_ref_status(
        &self,
        id: &str,
        ref_id: &str,
        status: ImageStatus,
        image_id: Option<String>,
        error: Option<String>,
    ) -> ChronicleResult<()> {
        let record = self.load(id).await?;
        let not_found = || {
            StorageError::new(StorageErrorKind::ImageRefNotFound {
                chronicle_id: id.to_string(),
                ref_id: ref_id.to_string(),
            })
        };
        let mut refs = record.image_refs.ok_or_else(not_found)?;
        let image_ref = refs
            .refs
            .iter_mut()
            .find(|r| r.id == ref_id)
            .ok_or_else(not_found)?;
        image_ref.status = status;
        if image_id.is_some() {
            image_ref.image_id = image_id;
        }
        image_ref.error = error;
        self.repository.update_image_refs(id, refs).await?;
        info!(chronicle_id = %id, ref_id, %status, "Image ref status updated");
        Ok(())
    }
}
