//! Core traits and types for the dealer conversation router
//!
//! This crate provides foundational types used across all other crates:
//! - Message, sentiment and customer context types
//! - Agent identities and routing decisions
//! - Escalation state and events
//! - Prompt templates and inventory contract types
//! - Error taxonomy
//! - Collaborator traits (classifier, context store, notifier, inventory, catalogue)

pub mod agent;
pub mod customer;
pub mod error;
pub mod escalation;
pub mod inventory;
pub mod message;
pub mod routing;
pub mod sentiment;
pub mod template;
pub mod traits;

pub use agent::{AgentKind, AgentProfile};
pub use customer::CustomerContext;
pub use error::{
    ClassificationError, Error, EscalationTransitionError, Result, RoutingDegradationError,
    TemplateBindingError,
};
pub use escalation::{EscalationEvent, EscalationReason, EscalationState, EscalationStatus};
pub use inventory::{
    Availability, InventoryFilters, InventorySearchResult, Vehicle, VehicleCondition,
    INVENTORY_CONTRACT_VERSION,
};
pub use message::Message;
pub use routing::RoutingDecision;
pub use sentiment::{Emotion, SentimentResult, TopicalIntent};
pub use template::{PromptTemplate, RenderedTemplate, TemplateType};

pub use traits::{
    ContextStore, EscalationNotifier, InventoryProvider, SentimentClassifier, TemplateCatalog,
};
