//! HTTP transport errors.

/// HTTP error raised by a text-generation transport, with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// Status code returned by the remote service, if a response arrived
    pub status: Option<u16>,
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Create an HttpError for a request that never produced a response.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle_error::HttpError;
    ///
    /// let err = HttpError::new("Connection refused");
    /// assert!(err.status.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            status: None,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create an HttpError for a non-success status code.
    #[track_caller]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            status: Some(status),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            Some(status) => status == 429 || status == 529 || status >= 500,
            None => true,
        }
    }
}
