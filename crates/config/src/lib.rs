//! Configuration management for the sari-sari store agent
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (SARI_SARI__ prefix, `__` separated)
//! - A YAML business catalog (inventory, promotions)

pub mod catalog;
pub mod router;
pub mod settings;

pub use catalog::load_catalog;
pub use router::{
    CloudProviderConfig, EndpointConfig, LocalProviderConfig, PreferredProvider, RouterConfig,
};
pub use settings::{
    load_settings, load_settings_from, NlpConfig, ObservabilityConfig, PersonalityConfig,
    ResponseConfig, RuntimeEnvironment, SearchConfig, ServerConfig, Settings,
    MAX_ROLLING_WINDOW_SECS,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for sari_sari_core::Error {
    fn from(err: ConfigError) -> Self {
        sari_sari_core::Error::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_core_error() {
        let err: sari_sari_core::Error = ConfigError::InvalidValue {
            field: "server.port".to_string(),
            message: "Must be greater than 0".to_string(),
        }
        .into();
        assert_eq!(
            err,
            sari_sari_core::Error::Configuration(
                "Invalid value for server.port: Must be greater than 0".to_string()
            )
        );
    }
}
