//! Configuration file loading and environment overrides.

use crate::config::{validate_config, Config};
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding the relay target.
pub const EXTERNAL_API_ENV: &str = "EXTERNAL_API";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a YAML file.
///
/// This function reads the file, parses the YAML, and validates the configuration.
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&contents)?;

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok(config)
}

/// Apply environment overrides to a configuration and re-validate it.
///
/// `lookup` resolves variable names, so callers pass `|k| std::env::var(k).ok()`
/// in production and a fixed map in tests. An empty `EXTERNAL_API` counts as unset.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(target) = lookup(EXTERNAL_API_ENV).filter(|v| !v.is_empty()) {
        config.relay.target = Some(target);
    }

    validate_config(&config).map_err(ConfigError::ValidationError)?;

    Ok(config)
}
