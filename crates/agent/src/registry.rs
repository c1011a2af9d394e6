//! Agent registry
//!
//! Loaded once from configuration and read-only afterwards. Utterances are
//! normalized at load time so routing never re-tokenizes them.

use std::collections::BTreeMap;
use std::path::Path;

use dealer_agent_config::AgentRegistryConfig;
use dealer_agent_core::{AgentKind, AgentProfile};

use crate::scoring::PreparedText;
use crate::{AgentError, Result};

/// Profile plus its prepared training utterances
#[derive(Debug, Clone)]
pub struct RegisteredAgent {
    pub profile: AgentProfile,
    pub utterances: Vec<PreparedText>,
}

impl RegisteredAgent {
    fn new(profile: AgentProfile) -> Self {
        let utterances = profile
            .training_utterances
            .iter()
            .map(|u| PreparedText::new(u))
            .collect();
        Self {
            profile,
            utterances,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.profile.agent_id
    }
}

/// Candidate agents keyed (and iterated) by agent id
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentKind, RegisteredAgent>,
    version: String,
}

impl AgentRegistry {
    /// Build from a validated registry document
    pub fn from_config(config: AgentRegistryConfig) -> Result<Self> {
        config.validate()?;

        let agents = config
            .agents
            .into_iter()
            .map(|profile| (profile.agent_id, RegisteredAgent::new(profile)))
            .collect();

        Ok(Self {
            agents,
            version: config.version,
        })
    }

    /// Build from profiles without document-level validation
    pub fn from_profiles(profiles: impl IntoIterator<Item = AgentProfile>) -> Self {
        Self {
            agents: profiles
                .into_iter()
                .map(|profile| (profile.agent_id, RegisteredAgent::new(profile)))
                .collect(),
            version: String::new(),
        }
    }

    /// Load the registry file. Any failure is an initialization error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = AgentRegistryConfig::load(path).map_err(|e| {
            AgentError::Initialization(format!(
                "agent registry {} failed to load: {}",
                path.display(),
                e
            ))
        })?;
        let registry = Self::from_config(config)?;

        tracing::info!(
            path = %path.display(),
            agents = registry.len(),
            version = %registry.version,
            "Loaded agent registry"
        );
        Ok(registry)
    }

    pub fn get(&self, kind: AgentKind) -> Option<&RegisteredAgent> {
        self.agents.get(&kind)
    }

    /// The general agent used for handoff and low-confidence fallback
    pub fn handoff(&self) -> Option<&RegisteredAgent> {
        self.agents.values().find(|a| a.kind().is_handoff())
    }

    /// Agents in id order
    pub fn agents(&self) -> impl Iterator<Item = &RegisteredAgent> {
        self.agents.values()
    }

    pub fn snapshot(&self) -> Vec<AgentProfile> {
        self.agents.values().map(|a| a.profile.clone()).collect()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPED: &str = include_str!("../../../config/agents.yaml");

    fn shipped() -> AgentRegistry {
        AgentRegistry::from_config(AgentRegistryConfig::from_yaml(SHIPPED).unwrap()).unwrap()
    }

    #[test]
    fn test_shipped_registry_has_all_agents() {
        let registry = shipped();
        assert_eq!(registry.len(), AgentKind::ALL.len());
        assert!(registry.handoff().is_some());
    }

    #[test]
    fn test_iteration_is_in_id_order() {
        let registry = shipped();
        let ids: Vec<AgentKind> = registry.agents().map(|a| a.kind()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_utterances_are_prepared() {
        let registry = shipped();
        let inventory = registry.get(AgentKind::Inventory).unwrap();
        assert_eq!(
            inventory.utterances.len(),
            inventory.profile.training_utterances.len()
        );
        assert!(inventory.utterances.iter().all(|u| !u.is_empty()));
    }

    #[test]
    fn test_missing_file_is_initialization_error() {
        let err = AgentRegistry::load("/nonexistent/agents.yaml").unwrap_err();
        assert!(matches!(err, AgentError::Initialization(_)));
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let config = AgentRegistryConfig {
            version: "1".to_string(),
            agents: vec![AgentProfile::new(AgentKind::Sales).with_utterances(["hi"])],
        };
        // no general agent
        assert!(AgentRegistry::from_config(config).is_err());
    }
}
