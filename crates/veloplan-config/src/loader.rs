//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::VeloplanConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load the full Veloplan configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<VeloplanConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: VeloplanConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &VeloplanConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.llm.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "llm.endpoint must not be empty".to_string(),
        ));
    }

    for (label, temperature) in [
        ("planner", config.planner.temperature),
        ("synthesizer", config.synthesizer.temperature),
    ] {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid(format!(
                "{}.temperature must be within 0.0..=2.0",
                label
            )));
        }
    }

    if config.tools.routing.profile.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "tools.routing.profile must not be empty".to_string(),
        ));
    }

    for (label, timeout) in [
        ("llm", config.llm.timeout_secs),
        ("tools.geocoding", config.tools.geocoding.timeout_secs),
        ("tools.weather", config.tools.weather.timeout_secs),
        ("tools.routing", config.tools.routing.timeout_secs),
    ] {
        if timeout == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.timeout_secs must be > 0",
                label
            )));
        }
    }

    Ok(())
}
