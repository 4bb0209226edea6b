//! Pipeline configuration and TOML loading

use actgraph_builder::EngineConfig;
use actgraph_services::ServicesConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_ACTIVITY_NAME: &str = "Generated activity";

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for [`PipelineConfig`]
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values break a constraint
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the activity created for each run
    pub activity_name: String,
    pub engine: EngineConfig,
    pub services: ServicesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            activity_name: DEFAULT_ACTIVITY_NAME.to_string(),
            engine: EngineConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_activity_name(mut self, name: impl Into<String>) -> Self {
        self.activity_name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_services(mut self, services: ServicesConfig) -> Self {
        self.services = services;
        self
    }
}

/// Read, parse and validate a TOML config file.
///
/// # Errors
/// [`ConfigError::Io`] when the file cannot be read, [`ConfigError::Parse`] on bad TOML
/// and [`ConfigError::Invalid`] when a value breaks a constraint.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse and validate TOML text.
///
/// # Errors
/// See [`load_config`].
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Check value constraints of an already parsed config.
///
/// # Errors
/// [`ConfigError::Invalid`] naming the first offending field.
pub fn validate_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.engine.max_search_depth == 0 {
        return Err(ConfigError::Invalid(
            "engine.max_search_depth must be > 0".to_string(),
        ));
    }

    if config.services.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "services.timeout_secs must be > 0".to_string(),
        ));
    }

    for (service, url) in config.services.endpoints() {
        if url.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "services.{service} must not be empty"
            )));
        }
    }

    if config.activity_name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "activity_name must not be empty".to_string(),
        ));
    }

    Ok(())
}
