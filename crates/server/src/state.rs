//! Application State
//!
//! Shared state across all handlers. The agent registry and template
//! catalogue are loaded once here; a load failure aborts startup.

use std::sync::Arc;
use std::time::Duration;

use dealer_agent_agent::{build_notifier, AgentRegistry, RoutingService, StaticTemplateCatalog};
use dealer_agent_config::{ClassifierBackend, ClassifierConfig, Settings};
use dealer_agent_core::SentimentClassifier;
use dealer_agent_text_processing::{HttpClassifier, LexiconClassifier};
use dealer_agent_tools::{create_inventory_registry, InMemoryInventory, ToolRegistry};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub router: Arc<RoutingService>,
    /// Inventory function-call bridge
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(config: Settings, router: RoutingService, tools: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            tools: Arc::new(tools),
        }
    }

    /// Build the full service graph from settings
    ///
    /// Loads `catalog.agents_path` and `catalog.templates_path`, selects the
    /// classifier backend and notifier, and binds the inventory tools to the
    /// sample lot.
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Initialization(e.to_string()))?;

        let registry = Arc::new(AgentRegistry::load(&config.catalog.agents_path)?);
        let catalog = Arc::new(StaticTemplateCatalog::load(&config.catalog.templates_path)?);
        let classifier = build_classifier(&config.classifier)?;
        let notifier = build_notifier(&config.notifier)?;

        tracing::info!(
            agents = registry.len(),
            registry_version = %registry.version(),
            templates = catalog.len(),
            classifier = %classifier.model_version(),
            notifier = %notifier.name(),
            "Loaded routing catalogues"
        );

        let router = RoutingService::from_settings(&config, registry, catalog, classifier)
            .with_notifier(notifier);
        let tools = create_inventory_registry(Arc::new(InMemoryInventory::sample()));

        Ok(Self::new(config, router, tools))
    }

    pub fn get_config(&self) -> &Settings {
        &self.config
    }
}

fn build_classifier(
    config: &ClassifierConfig,
) -> Result<Arc<dyn SentimentClassifier>, ServerError> {
    match config.backend {
        ClassifierBackend::Lexicon => Ok(Arc::new(LexiconClassifier::new())),
        ClassifierBackend::Http => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                ServerError::Initialization("classifier.endpoint is required".to_string())
            })?;
            let classifier = HttpClassifier::new(endpoint, Duration::from_millis(config.timeout_ms))
                .map_err(|e| ServerError::Initialization(e.to_string()))?;
            Ok(Arc::new(classifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealer_agent_config::CatalogConfig;

    fn shipped_settings() -> Settings {
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config");
        let mut settings = Settings::default();
        settings.catalog = CatalogConfig {
            agents_path: format!("{}/agents.yaml", root),
            templates_path: format!("{}/templates.yaml", root),
        };
        settings
    }

    #[test]
    fn test_from_settings_loads_shipped_catalogues() {
        let state = AppState::from_settings(shipped_settings()).unwrap();
        assert_eq!(state.router.get_agent_registry_snapshot().len(), 8);
        assert_eq!(state.tools.len(), 2);
    }

    #[test]
    fn test_missing_registry_is_fatal() {
        let mut settings = shipped_settings();
        settings.catalog.agents_path = "/nonexistent/agents.yaml".to_string();
        let err = AppState::from_settings(settings).err().unwrap();
        assert!(matches!(err, ServerError::Initialization(_)));
    }

    #[test]
    fn test_http_classifier_requires_endpoint() {
        let config = ClassifierConfig {
            backend: ClassifierBackend::Http,
            endpoint: None,
            ..ClassifierConfig::default()
        };
        assert!(build_classifier(&config).is_err());
    }
}
