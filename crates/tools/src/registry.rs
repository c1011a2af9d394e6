//! Tool Registry
//!
//! Manages tool registration, discovery, and execution.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dealer_agent_core::InventoryProvider;

use crate::inventory::{CheckAvailabilityTool, SearchInventoryTool};
use crate::schema::{Tool, ToolError, ToolOutput, ToolSchema};

/// Tool executor trait
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// Available tools, sorted by name
    fn list_tools(&self) -> Vec<ToolSchema>;

    fn get_tool(&self, name: &str) -> Option<ToolSchema>;
}

/// Tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Replaced existing tool registration");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    /// Validate, then execute under the tool's own timeout
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        tool.validate(&arguments)?;

        let timeout_secs = tool.timeout_secs();
        tracing::trace!(tool = name, timeout_secs, "Executing tool with timeout");

        match tokio::time::timeout(Duration::from_secs(timeout_secs), tool.execute(arguments)).await
        {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(tool = name, timeout_secs, "Tool execution timed out");
                Err(ToolError::timeout(name, timeout_secs))
            }
        }
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    fn get_tool(&self, name: &str) -> Option<ToolSchema> {
        self.tools.get(name).map(|t| t.schema())
    }
}

/// Registry with the inventory tools bound to a provider
pub fn create_inventory_registry(provider: Arc<dyn InventoryProvider>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(SearchInventoryTool::new(provider.clone()));
    registry.register(CheckAvailabilityTool::new(provider));

    tracing::info!(
        tool_count = registry.len(),
        contract_version = dealer_agent_core::INVENTORY_CONTRACT_VERSION,
        "Created tool registry"
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;
    use crate::schema::{InputSchema, PropertySchema};
    use serde_json::json;

    struct SleepyTool;

    #[async_trait]
    impl Tool for SleepyTool {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: InputSchema::object().property(
                    "note",
                    PropertySchema::string("Anything"),
                    false,
                ),
            }
        }

        async fn execute(&self, _input: Value) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ToolOutput::text("done"))
        }

        fn timeout_secs(&self) -> u64 {
            1
        }
    }

    fn registry() -> ToolRegistry {
        create_inventory_registry(Arc::new(InMemoryInventory::sample()))
    }

    #[test]
    fn test_inventory_registry_lists_tools_sorted() {
        let names: Vec<String> = registry().list_tools().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["check_availability", "search_inventory"]);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = registry().execute("nope", json!({})).await.unwrap_err();
        assert_eq!(err, ToolError::not_found("nope"));
    }

    #[tokio::test]
    async fn test_arguments_validated_before_execution() {
        let err = registry()
            .execute("check_availability", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let mut registry = ToolRegistry::new();
        registry.register(SleepyTool);
        let err = registry.execute("sleepy", json!({})).await.unwrap_err();
        assert_eq!(err, ToolError::timeout("sleepy", 1));
    }
}
