//! Inventory tools and an in-memory inventory backend

mod tools;

pub use tools::{CheckAvailabilityTool, SearchInventoryTool};

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealer_agent_core::{
    Availability, Error, InventoryFilters, InventoryProvider, InventorySearchResult, Result,
    Vehicle, VehicleCondition,
};
use parking_lot::RwLock;

/// Result cap when a search does not set `limit`
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const MAX_SEARCH_LIMIT: usize = 25;

type SampleVehicle = (
    &'static str,
    &'static str,
    u16,
    &'static str,
    &'static str,
    Option<&'static str>,
    VehicleCondition,
    f64,
    f64,
    u32,
);

const SAMPLE_LOT: &[SampleVehicle] = &[
    ("stk-1001", "5TDKDRAH0RS000101", 2024, "Toyota", "Highlander", Some("XLE"), VehicleCondition::New, 45_120.0, 44_300.0, 12),
    ("stk-1002", "4T1G11AK5RU000102", 2024, "Toyota", "Camry", Some("SE"), VehicleCondition::New, 29_495.0, 28_900.0, 8),
    ("stk-1003", "2T3P1RFV8RW000103", 2024, "Toyota", "RAV4", Some("XLE Premium"), VehicleCondition::New, 35_455.0, 35_455.0, 5),
    ("stk-2001", "3TMCZ5AN1MM000201", 2021, "Toyota", "Tacoma", Some("TRD Off-Road"), VehicleCondition::Used, 38_000.0, 33_750.0, 41_210),
    ("stk-2002", "1FTEW1EP5NF000202", 2022, "Ford", "F-150", Some("XLT"), VehicleCondition::Certified, 48_000.0, 39_995.0, 28_400),
    ("stk-2003", "4T1B11HK3KU000203", 2019, "Toyota", "Camry", None, VehicleCondition::Used, 24_000.0, 18_400.0, 62_030),
];

/// Vehicles and reservations held in memory
#[derive(Default)]
pub struct InMemoryInventory {
    vehicles: RwLock<Vec<Vehicle>>,
    reservations: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryInventory {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        Self {
            vehicles: RwLock::new(vehicles),
            reservations: RwLock::new(HashMap::new()),
        }
    }

    /// Small demo lot
    pub fn sample() -> Self {
        Self::new(
            SAMPLE_LOT
                .iter()
                .map(
                    |&(id, vin, year, make, model, trim, condition, msrp, price, mileage)| Vehicle {
                        vehicle_id: id.to_string(),
                        vin: vin.to_string(),
                        year,
                        make: make.to_string(),
                        model: model.to_string(),
                        trim: trim.map(str::to_string),
                        condition,
                        msrp,
                        price,
                        mileage,
                    },
                )
                .collect(),
        )
    }

    pub fn add(&self, vehicle: Vehicle) {
        self.vehicles.write().push(vehicle);
    }

    /// Hold a vehicle until `until`
    pub fn reserve(&self, vehicle_id: &str, until: DateTime<Utc>) -> Result<()> {
        if !self.contains(vehicle_id) {
            return Err(Error::Inventory(format!("Unknown vehicle {}", vehicle_id)));
        }
        self.reservations.write().insert(vehicle_id.to_string(), until);
        Ok(())
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.vehicles.read().iter().any(|v| v.vehicle_id == vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.read().is_empty()
    }
}

#[async_trait]
impl InventoryProvider for InMemoryInventory {
    async fn search(&self, filters: &InventoryFilters) -> Result<InventorySearchResult> {
        let mut matches: Vec<Vehicle> = self
            .vehicles
            .read()
            .iter()
            .filter(|v| filters.matches(v))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
        });

        let total_count = matches.len();
        let limit = filters
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        matches.truncate(limit);

        Ok(InventorySearchResult {
            vehicles: matches,
            total_count,
        })
    }

    async fn check_availability(&self, vehicle_id: &str) -> Result<Availability> {
        if !self.contains(vehicle_id) {
            return Err(Error::Inventory(format!("Unknown vehicle {}", vehicle_id)));
        }

        let reserved_until = self
            .reservations
            .read()
            .get(vehicle_id)
            .copied()
            .filter(|until| *until > Utc::now());

        Ok(Availability {
            vehicle_id: vehicle_id.to_string(),
            available: reserved_until.is_none(),
            reserved_until,
        })
    }
}
