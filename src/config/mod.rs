//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::warn;

use crate::common::error::ConfigError;

pub use parser::{load_config, load_config_str};
pub use types::*;

/// Load a config file, apply environment overrides, and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    for var in env::check_empty_env_vars() {
        warn!(var = %var, "Environment override is set but empty");
    }

    let config = env::apply_env_overrides(load_config(path)?);
    validate::validate_config(&config)?;
    Ok(config)
}
