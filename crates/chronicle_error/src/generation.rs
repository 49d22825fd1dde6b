//! Errors from the generative text service boundary.

/// Specific failure conditions of an external generation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The service reported an error; the message is kept verbatim
    #[display("{}", _0)]
    Upstream(String),
    /// The service answered but produced no text
    #[display("Empty response from text service for {}", _0)]
    EmptyResponse(String),
    /// The service response could not be decoded at the transport level
    #[display("Malformed service response: {}", _0)]
    MalformedResponse(String),
}

/// Error for a failed external generation call.
///
/// # Examples
///
/// ```
/// use chronicle_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Upstream("overloaded".to_string()));
/// assert_eq!(err.kind.to_string(), "overloaded");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
