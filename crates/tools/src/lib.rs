//! Function-call tools for dealership agents
//!
//! A narrow, versioned contract the selected agent can invoke while writing
//! its reply. Tool output is opaque to the router: it only ever reaches a
//! customer as a template variable.
//!
//! Tools:
//! - `search_inventory`: filter the vehicle inventory
//! - `check_availability`: availability and reservation of one vehicle

pub mod inventory;
pub mod registry;
pub mod schema;

pub use inventory::{CheckAvailabilityTool, InMemoryInventory, SearchInventoryTool};
pub use registry::{create_inventory_registry, ToolExecutor, ToolRegistry};
pub use schema::{
    ContentBlock, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema,
};
