//! Dealership conversation routing
//!
//! Features:
//! - Agent registry loaded from YAML with prepared training utterances
//! - Three-phase routing engine (history, sentiment, content scoring)
//! - Per-conversation escalation state machine
//! - Per-customer FIFO processing with retry deduplication
//! - Template selection and variable binding with a safe default
//! - Escalation notifiers (log, in-process channel, webhook)

pub mod context;
pub mod engine;
pub mod escalation;
pub mod notifier;
pub mod registry;
pub mod scoring;
pub mod service;
pub mod slots;
pub mod templates;

pub use context::InMemoryContextStore;
pub use engine::RoutingEngine;
pub use escalation::{AcknowledgeOutcome, EscalationStateMachine, EscalationTransition};
pub use notifier::{build_notifier, ChannelNotifier, LogNotifier, WebhookNotifier};
pub use registry::{AgentRegistry, RegisteredAgent};
pub use scoring::{AgentScore, ContentScorer, PreparedText};
pub use service::RoutingService;
pub use slots::{CustomerSlot, CustomerSlots};
pub use templates::{StaticTemplateCatalog, TemplateSelector, BUILTIN_FALLBACK_TEXT};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Context error: {0}")]
    Context(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Config error: {0}")]
    Config(#[from] dealer_agent_config::ConfigError),

    #[error("Core error: {0}")]
    Core(#[from] dealer_agent_core::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
