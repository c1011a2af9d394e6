//! Inventory function-call contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the inventory function signatures
pub const INVENTORY_CONTRACT_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCondition {
    New,
    Used,
    Certified,
}

impl VehicleCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCondition::New => "new",
            VehicleCondition::Used => "used",
            VehicleCondition::Certified => "certified",
        }
    }
}

/// Filters for `searchInventory`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryFilters {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year_min: Option<u16>,
    #[serde(default)]
    pub year_max: Option<u16>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub condition: Option<VehicleCondition>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl InventoryFilters {
    /// Whether a vehicle satisfies every set filter (limit excluded)
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        let eq = |want: &Option<String>, have: &str| {
            want.as_ref()
                .map(|w| w.eq_ignore_ascii_case(have))
                .unwrap_or(true)
        };
        eq(&self.make, &vehicle.make)
            && eq(&self.model, &vehicle.model)
            && self.year_min.map(|y| vehicle.year >= y).unwrap_or(true)
            && self.year_max.map(|y| vehicle.year <= y).unwrap_or(true)
            && self.max_price.map(|p| vehicle.price <= p).unwrap_or(true)
            && self
                .condition
                .map(|c| c == vehicle.condition)
                .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub vin: String,
    pub year: u16,
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub trim: Option<String>,
    pub condition: VehicleCondition,
    pub msrp: f64,
    pub price: f64,
    #[serde(default)]
    pub mileage: u32,
}

impl Vehicle {
    /// Short human-readable label, e.g. "2024 Toyota Highlander XLE"
    pub fn label(&self) -> String {
        match &self.trim {
            Some(trim) => format!("{} {} {} {}", self.year, self.make, self.model, trim),
            None => format!("{} {} {}", self.year, self.make, self.model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySearchResult {
    pub vehicles: Vec<Vehicle>,
    /// Matches before the limit was applied
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub vehicle_id: String,
    pub available: bool,
    pub reserved_until: Option<DateTime<Utc>>,
}
