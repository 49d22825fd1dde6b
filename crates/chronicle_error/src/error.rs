//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, GenerationError, HttpError, JsonError, StepError, StorageError,
};

/// Every error condition the pipeline can produce.
///
/// # Examples
///
/// ```
/// use chronicle_error::{ChronicleError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: ChronicleError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ChronicleErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Record store error
    #[from(StorageError)]
    Storage(StorageError),
    /// External generation call error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Step dispatch or handler error
    #[from(StepError)]
    Step(StepError),
}

/// Chronicle pipeline error with kind discrimination.
///
/// # Examples
///
/// ```
/// use chronicle_error::{ChronicleResult, ConfigError};
///
/// fn might_fail() -> ChronicleResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.user_message(), "Missing field");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Chronicle Error: {}", _0)]
pub struct ChronicleError(Box<ChronicleErrorKind>);

impl ChronicleError {
    /// Create a new error from a kind.
    pub fn new(kind: ChronicleErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ChronicleErrorKind {
        &self.0
    }

    /// The condition message without wrapper prefixes or source locations.
    ///
    /// This is what callers surface to users verbatim.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ChronicleErrorKind::Http(e) => e.message.clone(),
            ChronicleErrorKind::Json(e) => e.message.clone(),
            ChronicleErrorKind::Config(e) => match &e.key {
                Some(key) => format!("{}: {}", key, e.message),
                None => e.message.clone(),
            },
            ChronicleErrorKind::Builder(e) => e.message.clone(),
            ChronicleErrorKind::Storage(e) => e.kind.to_string(),
            ChronicleErrorKind::Generation(e) => e.kind.to_string(),
            ChronicleErrorKind::Step(e) => e.kind.to_string(),
        }
    }

    /// The step error kind, if this is a step error.
    pub fn step_kind(&self) -> Option<&crate::StepErrorKind> {
        match self.kind() {
            ChronicleErrorKind::Step(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Whether this error is a cooperative-cancellation result.
    pub fn is_aborted(&self) -> bool {
        matches!(self.step_kind(), Some(crate::StepErrorKind::Aborted { .. }))
    }

    /// Whether this error was raised before any external call was made.
    pub fn is_precondition(&self) -> bool {
        match self.kind() {
            ChronicleErrorKind::Step(e) => e.kind.is_precondition(),
            _ => false,
        }
    }

    /// Diagnostic payload carried by parse failures and aborts.
    pub fn debug_payload(&self) -> Option<&str> {
        match self.kind() {
            ChronicleErrorKind::Step(e) => e.debug_payload(),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to ChronicleErrorKind
impl<T> From<T> for ChronicleError
where
    T: Into<ChronicleErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for chronicle pipeline operations.
pub type ChronicleResult<T> = std::result::Result<T, ChronicleError>;
