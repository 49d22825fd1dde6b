//! Configuration error types.

/// Configuration error, optionally tied to the settings key that caused it.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Offending settings key, e.g. `calls.summary.model`
    pub key: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle_error::ConfigError;
    ///
    /// let err = ConfigError::new("Failed to read chronicle.toml");
    /// assert!(err.key.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            key: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a ConfigError naming the settings key at fault.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicle_error::ConfigError;
    ///
    /// let err = ConfigError::for_key("calls.summary.model", "No model configured");
    /// assert!(err.to_string().contains("[calls.summary.model]"));
    /// ```
    #[track_caller]
    pub fn for_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            key: Some(key.into()),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration Error: ")?;
        if let Some(key) = &self.key {
            write!(f, "[{}] ", key)?;
        }
        write!(f, "{} at line {} in {}", self.message, self.line, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_errors_name_the_setting() {
        let err = ConfigError::for_key("calls.compare.max_tokens", "Missing token budget");
        let shown = err.to_string();
        assert!(shown.starts_with("Configuration Error: [calls.compare.max_tokens] Missing"));
        assert!(shown.contains("config.rs"));

        let plain = ConfigError::new("Unreadable file").to_string();
        assert!(plain.starts_with("Configuration Error: Unreadable file at line"));
    }
}
