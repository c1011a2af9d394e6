use async_trait::async_trait;

use crate::error::Result;
use crate::inventory::{Availability, InventoryFilters, InventorySearchResult};

/// Backend behind the inventory function calls
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn search(&self, filters: &InventoryFilters) -> Result<InventorySearchResult>;

    async fn check_availability(&self, vehicle_id: &str) -> Result<Availability>;
}
