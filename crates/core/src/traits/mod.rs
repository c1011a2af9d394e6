//! Collaborator traits for the router
//!
//! Every external dependency of the routing path sits behind one of these
//! traits so backends can be swapped by configuration and mocked in tests.
//!
//! ```text
//! SentimentClassifier  text -> emotion, intensity, urgency, topics
//! ContextStore         read-one / write-one CustomerContext by customer id
//! TemplateCatalog      active templates by type, plus the default template
//! EscalationNotifier   fire-and-forget escalation events
//! InventoryProvider    searchInventory / checkAvailability backend
//! ```

mod catalog;
mod classifier;
mod context_store;
mod inventory;
mod notifier;

pub use catalog::TemplateCatalog;
pub use classifier::SentimentClassifier;
pub use context_store::ContextStore;
pub use inventory::InventoryProvider;
pub use notifier::EscalationNotifier;
