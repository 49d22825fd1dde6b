//! Configuration and stores shared by every command.

use chronicle::{
    AnthropicClient, CallType, ChronicleDispatcher, ChronicleResult, ConfigError,
    FileChronicleRepository, JsonError, JsonlCostSink, PipelineConfig,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dispatcher over the live text service and the file-backed stores.
pub type FileDispatcher = ChronicleDispatcher<AnthropicClient, FileChronicleRepository, JsonlCostSink>;

/// Resolved configuration plus the store location.
#[derive(Debug)]
pub struct Session {
    config: PipelineConfig,
    store_path: PathBuf,
}

impl Session {
    /// Load configuration and pick the store directory.
    ///
    /// An explicit config file is layered over the bundled defaults only;
    /// otherwise the usual home, working-directory and environment layers apply.
    pub fn open(config_path: Option<&Path>, store: Option<PathBuf>) -> ChronicleResult<Self> {
        let config = match config_path {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::load()?,
        };
        let store_path = store.unwrap_or_else(|| config.storage.path.clone());
        debug!(store = %store_path.display(), "Session opened");
        Ok(Self { config, store_path })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The record store.
    pub fn repository(&self) -> ChronicleResult<FileChronicleRepository> {
        FileChronicleRepository::new(&self.store_path)
    }

    /// A dispatcher over the Anthropic text service.
    ///
    /// Reads `ANTHROPIC_API_KEY` from the environment.
    pub fn dispatcher(&self) -> ChronicleResult<FileDispatcher> {
        let profile = self.config.resolve_calls()?;
        let client = AnthropicClient::from_env(profile.get(CallType::Generation).model().clone())?
            .with_pricing(self.config.pricing.clone());
        ChronicleDispatcher::new(
            client,
            self.repository()?,
            JsonlCostSink::new(&self.store_path)?,
            &self.config,
        )
    }
}

/// Read and deserialize a JSON input file.
pub fn read_json<T>(path: &Path) -> ChronicleResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::new(format!("Failed to read {}: {}", path.display(), e)))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| JsonError::new(format!("Invalid JSON in {}: {}", path.display(), e)))?;
    Ok(value)
}
