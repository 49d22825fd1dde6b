//! Record stores and cost sinks.
//!
//! - [`InMemoryChronicleRepository`] / [`InMemoryCostSink`] for tests and embedding
//! - [`FileChronicleRepository`] / [`JsonlCostSink`] for the command line
//!
//! Stores migrate records on every load. Narrow updates modify only their own
//! field and the update timestamp.

mod file;
mod memory;

pub use file::{FileChronicleRepository, JsonlCostSink};
pub use memory::{InMemoryChronicleRepository, InMemoryCostSink};

use chronicle_core::ChronicleRecord;
use chronicle_error::{StorageError, StorageErrorKind};

#[track_caller]
pub(crate) fn not_found(id: &str) -> StorageError {
    StorageError::new(StorageErrorKind::NotFound(format!("chronicle {}", id)))
}

/// Migrate a freshly loaded record, logging when anything changed.
pub(crate) fn migrated(mut record: ChronicleRecord) -> ChronicleRecord {
    if record.migrate() {
        tracing::info!(chronicle_id = %record.id, "Migrated chronicle record to current schema");
    }
    record
}
