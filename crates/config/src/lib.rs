//! Configuration management for the dealer conversation router
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (DEALER_AGENT_ prefix, `__` separator)
//!
//! The agent registry (`config/agents.yaml`) and the template catalogue
//! (`config/templates.yaml`) are separate YAML documents loaded once at
//! startup. Failing to load either is fatal.

pub mod constants;
pub mod registry;
pub mod routing;
pub mod settings;
pub mod templates;

pub use registry::AgentRegistryConfig;
pub use routing::{
    ClassifierBackend, ClassifierConfig, EscalationConfig, NotifierConfig, NotifierKind,
    RoutingConfig,
};
pub use settings::{
    load_settings, load_settings_from, CatalogConfig, ObservabilityConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};
pub use templates::TemplateCatalogConfig;

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
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Read a YAML document from disk
pub(crate) fn read_yaml<T, P>(path: P) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<std::path::Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    Ok(serde_yaml::from_str(&content)?)
}
