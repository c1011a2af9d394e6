//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::paths;
use crate::{ClassifierConfig, ConfigError, EscalationConfig, NotifierConfig, RoutingConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Routing thresholds
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Escalation event delivery
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Registry and catalogue file locations
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.routing.validate()?;
        self.escalation.validate()?;
        self.classifier.validate()?;
        self.notifier.validate()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "Port cannot be 0"));
        }

        if self.environment.is_strict() && !self.server.cors_enabled {
            return Err(ConfigError::invalid(
                "server.cors_enabled",
                "CORS must be enabled outside development",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_agents_path")]
    pub agents_path: String,

    #[serde(default = "default_templates_path")]
    pub templates_path: String,
}

fn default_agents_path() -> String {
    paths::AGENTS.to_string()
}
fn default_templates_path() -> String {
    paths::TEMPLATES.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            agents_path: default_agents_path(),
            templates_path: default_templates_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` in the working directory
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(
        File::with_name(&dir.join("default").to_string_lossy()).required(false),
    );

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DEALER_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        dir = %dir.display(),
        "Settings loaded"
    );

    Ok(settings)
}
