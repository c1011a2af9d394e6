//! Agent registry file
//!
//! The registry is read once at startup. Any problem with it is fatal: the
//! router cannot run without a complete, valid set of profiles.

use dealer_agent_core::{AgentKind, AgentProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistryConfig {
    #[serde(default)]
    pub version: String,
    pub agents: Vec<AgentProfile>,
}

impl AgentRegistryConfig {
    /// Load and validate a registry file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = crate::read_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a registry document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::MissingField("agents".to_string()));
        }

        let mut seen = HashSet::new();
        for profile in &self.agents {
            let id = profile.agent_id.as_str();
            if !seen.insert(profile.agent_id) {
                return Err(ConfigError::invalid(
                    format!("agents.{}", id),
                    "Duplicate agent id",
                ));
            }
            if profile.training_utterances.is_empty() {
                return Err(ConfigError::invalid(
                    format!("agents.{}.training_utterances", id),
                    "At least one training utterance is required",
                ));
            }
            if profile
                .training_utterances
                .iter()
                .any(|u| u.trim().is_empty())
            {
                return Err(ConfigError::invalid(
                    format!("agents.{}.training_utterances", id),
                    "Utterances cannot be blank",
                ));
            }
            if !profile.priority_weight.is_finite() || profile.priority_weight <= 0.0 {
                return Err(ConfigError::invalid(
                    format!("agents.{}.priority_weight", id),
                    format!("Must be a positive number, got {}", profile.priority_weight),
                ));
            }
        }

        if !seen.contains(&AgentKind::General) {
            return Err(ConfigError::MissingField("agents.general".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPED: &str = include_str!("../../../config/agents.yaml");

    #[test]
    fn test_shipped_registry_is_valid() {
        let config = AgentRegistryConfig::from_yaml(SHIPPED).unwrap();
        assert_eq!(config.agents.len(), AgentKind::ALL.len());
        assert!(config
            .agents
            .iter()
            .any(|a| a.agent_id == AgentKind::General));
    }

    #[test]
    fn test_unknown_agent_id_is_rejected() {
        let yaml = r#"
agents:
  - agent_id: warranty
    training_utterances: ["extend my warranty"]
"#;
        assert!(matches!(
            AgentRegistryConfig::from_yaml(yaml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_general_is_rejected() {
        let yaml = r#"
agents:
  - agent_id: sales
    training_utterances: ["I want to buy"]
"#;
        let err = AgentRegistryConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("agents.general"));
    }

    #[test]
    fn test_duplicate_and_bad_weight_rejected() {
        let duplicate = r#"
agents:
  - agent_id: general
    training_utterances: ["hi"]
  - agent_id: general
    training_utterances: ["hello"]
"#;
        assert!(AgentRegistryConfig::from_yaml(duplicate).is_err());

        let bad_weight = r#"
agents:
  - agent_id: general
    priority_weight: 0
    training_utterances: ["hi"]
"#;
        assert!(AgentRegistryConfig::from_yaml(bad_weight).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgentRegistryConfig::load("/nonexistent/agents.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.yaml");
        std::fs::write(&path, SHIPPED).unwrap();
        assert!(AgentRegistryConfig::load(&path).is_ok());
    }
}
