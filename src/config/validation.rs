// src/config/validation.rs

use super::Config;
use crate::errors::{Error, Result};

/// Checks value ranges that types alone cannot express.
pub(super) fn validate_config(config: &Config) -> Result<()> {
    if config.workers == 0 {
        return Err(Error::Config("workers must be at least 1".to_string()));
    }
    if config.max_iterations == 0 {
        return Err(Error::Config("max_iterations must be at least 1".to_string()));
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(Error::Config(format!(
            "temperature must be between 0 and 2, got {}",
            config.llm.temperature
        )));
    }
    if config.llm.timeout.is_zero() {
        return Err(Error::Config("LLM timeout must be greater than zero".to_string()));
    }
    if config.llm.model.trim().is_empty() {
        return Err(Error::Config("model selector is empty".to_string()));
    }
    // Surface unknown selectors before any work starts.
    config.llm.models.resolve(&config.llm.model)?;
    Ok(())
}
