//! Step dispatch and handler errors.

/// Specific error conditions raised while dispatching or running a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StepErrorKind {
    /// The task named a step that does not exist
    #[display("Unknown step: {}", _0)]
    UnknownStep(String),
    /// The step needs a chronicle id and none was supplied
    #[display("Step '{}' requires a chronicle id", _0)]
    MissingChronicleId(String),
    /// The step needs a generation context and none was supplied
    #[display("Step '{}' requires a chronicle context", _0)]
    MissingContext(String),
    /// The referenced chronicle does not exist
    #[display("Chronicle not found: {}", _0)]
    ChronicleNotFound(String),
    /// The chronicle has been accepted and is locked against this step
    #[display("Chronicle {} is accepted; step '{}' is not allowed", chronicle_id, step)]
    Locked {
        /// Locked chronicle
        chronicle_id: String,
        /// Step that was refused
        step: String,
    },
    /// A prerequisite field or state is missing
    #[display("Precondition failed: {}", _0)]
    Precondition(String),
    /// A structured response failed validation
    #[display("Failed to parse {} response: {}", what, message)]
    Parse {
        /// What was being parsed (e.g. "image refs")
        what: String,
        /// Why it failed
        message: String,
        /// Raw response text kept for diagnostics
        raw: Option<String>,
    },
    /// The step was cancelled cooperatively
    #[display("Step '{}' aborted", step)]
    Aborted {
        /// Step that was cancelled
        step: String,
        /// Diagnostic payload produced before cancellation
        debug: Option<String>,
    },
}

impl StepErrorKind {
    /// Whether this condition was detected before any external call.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            StepErrorKind::UnknownStep(_)
                | StepErrorKind::MissingChronicleId(_)
                | StepErrorKind::MissingContext(_)
                | StepErrorKind::ChronicleNotFound(_)
                | StepErrorKind::Locked { .. }
                | StepErrorKind::Precondition(_)
        )
    }
}

/// Error type for step dispatch and handlers.
///
/// # Examples
///
/// ```
/// use chronicle_error::{StepError, StepErrorKind};
///
/// let err = StepError::new(StepErrorKind::UnknownStep("publish".to_string()));
/// assert!(err.kind.is_precondition());
/// assert!(format!("{}", err).contains("Unknown step"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Step Error: {} at line {} in {}", kind, line, file)]
pub struct StepError {
    /// The specific error condition
    pub kind: StepErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StepError {
    /// Create a new StepError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StepErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Diagnostic payload attached to parse failures and aborts.
    pub fn debug_payload(&self) -> Option<&str> {
        match &self.kind {
            StepErrorKind::Parse { raw, .. } => raw.as_deref(),
            StepErrorKind::Aborted { debug, .. } => debug.as_deref(),
            _ => None,
        }
    }
}
