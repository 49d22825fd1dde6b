//! Pipeline configuration.
//!
//! Configuration is layered with the `config` crate:
//! - Bundled defaults (include_str! from chronicle.toml)
//! - `~/.config/chronicle/chronicle.toml`
//! - `./chronicle.toml`
//! - `CHRONICLE__*` environment variables
//!
//! Per call type settings are merged over the `[calls.default]` block and
//! resolved once into a [`CallProfile`] that handlers receive by reference.

use chronicle_core::{CallType, ModelPricing, SamplingMode, SamplingParams};
use chronicle_error::{ChronicleError, ChronicleResult, ConfigError};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../chronicle.toml");

/// Fully resolved settings for one call type.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct ResolvedCall {
    /// Call type
    call_type: CallType,
    /// Model identifier
    model: String,
    /// Maximum completion tokens
    max_tokens: u32,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Nucleus-sampling cutoff
    top_p: Option<f32>,
}

impl ResolvedCall {
    /// Sampling parameters as configured.
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }

    /// Sampling parameters varying only the nucleus cutoff.
    pub fn nucleus_sampling(&self, top_p: f32) -> SamplingParams {
        SamplingParams {
            temperature: None,
            top_p: Some(top_p),
            max_tokens: self.max_tokens,
        }
    }
}

/// Resolved settings for every call type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallProfile {
    calls: HashMap<CallType, ResolvedCall>,
}

impl CallProfile {
    /// Settings for a call type.
    pub fn get(&self, call_type: CallType) -> &ResolvedCall {
        // resolve() fills every call type, so the map is total
        &self.calls[&call_type]
    }
}

/// Nucleus-sampling cutoffs per sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Cutoff for `normal`
    pub normal_top_p: f32,
    /// Cutoff for `low`
    pub low_top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            normal_top_p: 1.0,
            low_top_p: 0.9,
        }
    }
}

impl SamplingConfig {
    /// Cutoff for a sampling mode.
    pub fn top_p(&self, mode: SamplingMode) -> f32 {
        match mode {
            SamplingMode::Normal => self.normal_top_p,
            SamplingMode::Low => self.low_top_p,
        }
    }
}

/// Bounds on the entity neighborhood selected around the cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// Related entities beyond the cast
    pub max_related_entities: usize,
    /// Relationships among selected entities
    pub max_relationships: usize,
    /// Events involving selected entities
    pub max_events: usize,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self {
            max_related_entities: 10,
            max_relationships: 24,
            max_events: 12,
        }
    }
}

/// Image placement planning settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRefsConfig {
    /// Fewest chunks
    pub min_chunks: usize,
    /// Most chunks
    pub max_chunks: usize,
    /// Fewest placements accepted
    pub min_refs: usize,
    /// Most placements kept
    pub max_refs: usize,
    /// Minimum fuzzy score for anchor resolution
    pub anchor_threshold: f64,
    /// Keep placements whose anchor could not be resolved (without an offset)
    pub keep_unresolved: bool,
}

impl Default for ImageRefsConfig {
    fn default() -> Self {
        Self {
            min_chunks: 3,
            max_chunks: 7,
            min_refs: 2,
            max_refs: 5,
            anchor_threshold: 0.6,
            keep_unresolved: true,
        }
    }
}

/// Quick-check settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickCheckConfig {
    /// Most locally scanned candidates sent for review
    pub max_candidates: usize,
}

impl Default for QuickCheckConfig {
    fn default() -> Self {
        Self { max_candidates: 40 }
    }
}

/// File-backed store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding records and the cost ledger
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".chronicle"),
        }
    }
}

/// Top-level pipeline configuration.
///
/// # Example
///
/// ```
/// use chronicle_pipeline::PipelineConfig;
/// use chronicle_core::CallType;
///
/// let config = PipelineConfig::from_toml_str(r#"
///     [calls.default]
///     model = "claude-sonnet-4-5"
///     max_tokens = 1024
///
///     [calls.summary]
///     max_tokens = 300
/// "#).unwrap();
///
/// let profile = config.resolve_calls().unwrap();
/// assert_eq!(*profile.get(CallType::Summary).max_tokens(), 300);
/// assert_eq!(*profile.get(CallType::Compare).max_tokens(), 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per call type settings, keyed by call type name plus `default`
    pub calls: HashMap<String, CallSettings>,
    /// Sampling-mode cutoffs
    pub sampling: SamplingConfig,
    /// Model prices
    pub pricing: HashMap<String, ModelPricing>,
    /// Neighborhood bounds
    pub neighborhood: NeighborhoodConfig,
    /// Image planning
    pub image_refs: ImageRefsConfig,
    /// Quick check
    pub quick_check: QuickCheckConfig,
    /// File store
    pub storage: StorageConfig,
}

/// Call settings as written in configuration; unset fields inherit from `default`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallSettings {
    /// Model identifier
    pub model: Option<String>,
    /// Maximum completion tokens
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Nucleus-sampling cutoff
    pub top_p: Option<f32>,
}

impl PipelineConfig {
    /// Load configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ChronicleResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ChronicleResult<Self> {
        debug!("Loading configuration from file");
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped when missing.
    #[instrument]
    pub fn load() -> ChronicleResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/chronicle/chronicle.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("chronicle").required(false))
            .add_source(
                Environment::with_prefix("CHRONICLE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    /// The bundled defaults alone.
    pub fn bundled() -> ChronicleResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ChronicleResult<Self> {
        builder
            .build()
            .map_err(|e| {
                ChronicleError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ChronicleError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Merge every call type over `default` into a [`CallProfile`].
    ///
    /// # Errors
    ///
    /// Fails when a call type ends up without a model or max token budget.
    pub fn resolve_calls(&self) -> ChronicleResult<CallProfile> {
        use strum::IntoEnumIterator;

        for key in self.calls.keys() {
            if key != "default" && CallType::from_str(key).is_err() {
                warn!(key = %key, "Ignoring settings for unknown call type");
            }
        }

        let default = self.calls.get("default").cloned().unwrap_or_default();
        let mut calls = HashMap::new();
        for call_type in CallType::iter() {
            let specific = self
                .calls
                .get(&call_type.to_string())
                .cloned()
                .unwrap_or_default();
            let model = specific
                .model
                .or_else(|| default.model.clone())
                .ok_or_else(|| {
                    ConfigError::for_key(
                        format!("calls.{}.model", call_type),
                        format!("No model configured for call type {}", call_type),
                    )
                })?;
            let max_tokens = specific.max_tokens.or(default.max_tokens).ok_or_else(|| {
                ConfigError::for_key(
                    format!("calls.{}.max_tokens", call_type),
                    format!("No max_tokens configured for call type {}", call_type),
                )
            })?;
            calls.insert(
                call_type,
                ResolvedCall {
                    call_type,
                    model,
                    max_tokens,
                    temperature: specific.temperature.or(default.temperature),
                    top_p: specific.top_p.or(default.top_p),
                },
            );
        }
        Ok(CallProfile { calls })
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> ChronicleResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)).into())
    }
}
