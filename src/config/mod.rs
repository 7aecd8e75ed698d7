//! Configuration loading, parsing, and validation.

mod loader;
mod types;
mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError, EXTERNAL_API_ENV};
pub use types::*;
pub use validation::validate_config;
