//! Record store error types.

/// Kinds of record store errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// No chronicle is stored under the id
    #[display("Chronicle not found: {}", _0)]
    NotFound(String),
    /// A chronicle already exists under the id
    #[display("Chronicle already exists: {}", _0)]
    AlreadyExists(String),
    /// The chronicle has no version with the given id
    #[display("Version {} not found in chronicle {}", version_id, chronicle_id)]
    VersionNotFound {
        /// Chronicle that was searched
        chronicle_id: String,
        /// Version id that was requested
        version_id: String,
    },
    /// The chronicle has no image ref with the given id
    #[display("Image ref {} not found in chronicle {}", ref_id, chronicle_id)]
    ImageRefNotFound {
        /// Chronicle that was searched
        chronicle_id: String,
        /// Image ref id that was requested
        ref_id: String,
    },
    /// The requested mutation would break a record invariant
    #[display("Invalid record state: {}", _0)]
    InvalidState(String),
    /// Filesystem failure in a file-backed store
    #[display("I/O failure: {}", _0)]
    Io(String),
    /// Record could not be encoded or decoded
    #[display("Serialization failure: {}", _0)]
    Serialization(String),
}

/// Record store error with location tracking.
///
/// # Examples
///
/// ```
/// use chronicle_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("chr-1".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
