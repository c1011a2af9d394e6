use std::sync::Arc;

use async_trait::async_trait;
use dealer_agent_core::{InventoryFilters, InventoryProvider, INVENTORY_CONTRACT_VERSION};
use serde_json::{json, Value};

use super::MAX_SEARCH_LIMIT;
use crate::schema::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};

/// "$44,300" style price
fn format_price(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${}", out)
}

/// `searchInventory(filters) -> {vehicles, totalCount}`
pub struct SearchInventoryTool {
    provider: Arc<dyn InventoryProvider>,
}

impl SearchInventoryTool {
    pub fn new(provider: Arc<dyn InventoryProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for SearchInventoryTool {
    fn name(&self) -> &str {
        "search_inventory"
    }

    fn description(&self) -> &str {
        "Search dealership inventory by make, model, year, price and condition"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("make", PropertySchema::string("Vehicle make, e.g. Toyota"), false)
                .property("model", PropertySchema::string("Vehicle model, e.g. Camry"), false)
                .property(
                    "year_min",
                    PropertySchema::integer("Earliest model year").with_range(1980.0, 2100.0),
                    false,
                )
                .property(
                    "year_max",
                    PropertySchema::integer("Latest model year").with_range(1980.0, 2100.0),
                    false,
                )
                .property(
                    "max_price",
                    PropertySchema::number("Maximum selling price in dollars").with_minimum(0.0),
                    false,
                )
                .property(
                    "condition",
                    PropertySchema::enum_type(
                        "Vehicle condition",
                        vec!["new".into(), "used".into(), "certified".into()],
                    ),
                    false,
                )
                .property(
                    "limit",
                    PropertySchema::integer("Maximum vehicles to return")
                        .with_range(1.0, MAX_SEARCH_LIMIT as f64)
                        .with_default(json!(super::DEFAULT_SEARCH_LIMIT)),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let filters: InventoryFilters = serde_json::from_value(input)
            .map_err(|e| ToolError::invalid_params(e.to_string()))?;

        let result = self.provider.search(&filters).await?;

        let summary = if result.vehicles.is_empty() {
            "No vehicles currently match that search.".to_string()
        } else {
            let listed: Vec<String> = result
                .vehicles
                .iter()
                .map(|v| format!("{} ({})", v.label(), format_price(v.price)))
                .collect();
            format!(
                "{} matching vehicle{}: {}",
                result.total_count,
                if result.total_count == 1 { "" } else { "s" },
                listed.join(", ")
            )
        };

        tracing::debug!(
            total_count = result.total_count,
            returned = result.vehicles.len(),
            "Inventory search"
        );

        Ok(ToolOutput::json(json!({
            "contract_version": INVENTORY_CONTRACT_VERSION,
            "vehicles": result.vehicles,
            "total_count": result.total_count,
            "summary": summary,
        })))
    }

    fn timeout_secs(&self) -> u64 {
        5
    }
}

/// `checkAvailability(vehicleId) -> {available, reservedUntil}`
pub struct CheckAvailabilityTool {
    provider: Arc<dyn InventoryProvider>,
}

impl CheckAvailabilityTool {
    pub fn new(provider: Arc<dyn InventoryProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "Check whether a specific vehicle is available or on hold"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "vehicle_id",
                PropertySchema::string("Stock id of the vehicle"),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let vehicle_id = input
            .get("vehicle_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("vehicle_id is required"))?;

        let availability = self.provider.check_availability(vehicle_id).await?;

        let summary = match (availability.available, availability.reserved_until) {
            (true, _) => "The vehicle is available.".to_string(),
            (false, Some(until)) => format!(
                "The vehicle is on hold until {}.",
                until.format("%b %-d at %-I:%M %p UTC")
            ),
            (false, None) => "The vehicle is not available.".to_string(),
        };

        Ok(ToolOutput::json(json!({
            "contract_version": INVENTORY_CONTRACT_VERSION,
            "vehicle_id": availability.vehicle_id,
            "available": availability.available,
            "reserved_until": availability.reserved_until,
            "summary": summary,
        })))
    }

    fn timeout_secs(&self) -> u64 {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InMemoryInventory;
    use chrono::{Duration, Utc};

    fn provider() -> Arc<InMemoryInventory> {
        Arc::new(InMemoryInventory::sample())
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(44_300.0), "$44,300");
        assert_eq!(format_price(999.4), "$999");
        assert_eq!(format_price(1_234_567.0), "$1,234,567");
    }

    #[tokio::test]
    async fn test_search_summary_feeds_templates() {
        let tool = SearchInventoryTool::new(provider());
        let output = tool
            .execute(json!({"model": "Highlander"}))
            .await
            .unwrap();
        assert_eq!(
            output.as_reply_fragment(),
            "1 matching vehicle: 2024 Toyota Highlander XLE ($44,300)"
        );
    }

    #[tokio::test]
    async fn test_search_without_matches() {
        let tool = SearchInventoryTool::new(provider());
        let output = tool.execute(json!({"make": "Lamborghini"})).await.unwrap();
        assert!(output.as_reply_fragment().starts_with("No vehicles"));
    }

    #[tokio::test]
    async fn test_search_rejects_bad_condition() {
        let tool = SearchInventoryTool::new(provider());
        assert!(tool.validate(&json!({"condition": "salvage"})).is_err());
        assert!(tool.execute(json!({"condition": "salvage"})).await.is_err());
    }

    #[tokio::test]
    async fn test_availability_reports_hold() {
        let inventory = provider();
        inventory
            .reserve("stk-1002", Utc::now() + Duration::hours(2))
            .unwrap();
        let tool = CheckAvailabilityTool::new(inventory);

        let output = tool.execute(json!({"vehicle_id": "stk-1002"})).await.unwrap();
        match &output.content[0] {
            crate::schema::ContentBlock::Json { value } => {
                assert_eq!(value["available"], false);
                assert_eq!(value["contract_version"], "v1");
            }
            other => panic!("unexpected block: {:?}", other),
        }
        assert!(output.as_reply_fragment().contains("on hold"));
    }

    #[tokio::test]
    async fn test_unknown_vehicle_is_execution_error() {
        let tool = CheckAvailabilityTool::new(provider());
        let err = tool
            .execute(json!({"vehicle_id": "stk-9999"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }
}
