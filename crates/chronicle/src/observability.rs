//! Logging setup for the chronicle binary.

use chronicle_error::{ChronicleResult, ConfigError};
use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,chronicle=debug";

/// Configuration for structured logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log filter directives (e.g., "info", "chronicle_pipeline=trace")
    pub log_level: String,
    /// Enable JSON-formatted logs for structured logging
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Create a new configuration with the given service name.
    ///
    /// The filter comes from `RUST_LOG` when set.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
            json_logs: false,
        }
    }

    /// Set the log filter.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Parse the configured filter directives.
pub fn env_filter(config: &ObservabilityConfig) -> ChronicleResult<EnvFilter> {
    EnvFilter::try_new(&config.log_level).map_err(|e| {
        ConfigError::new(format!("Invalid log filter '{}': {}", config.log_level, e)).into()
    })
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
///
/// # Errors
///
/// Fails when the filter does not parse or a subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> ChronicleResult<()> {
    let filter = env_filter(&config)?;
    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let config = ObservabilityConfig::new("chronicle").with_log_level(DEFAULT_FILTER);
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn invalid_filter_is_a_config_error() {
        let config = ObservabilityConfig::new("chronicle").with_log_level("chronicle=loudest");
        assert!(env_filter(&config).is_err());
    }
}
