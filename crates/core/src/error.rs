//! Error types shared across the router
//!
//! Each failure kind named by the routing contract has its own type so callers
//! can decide locally whether it degrades, falls back or is only logged.

use thiserror::Error;

use crate::escalation::EscalationStatus;

/// Classifier failures. Recovered by substituting a neutral sentiment.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Message text is empty")]
    EmptyInput,

    #[error("Message text could not be parsed: {0}")]
    Unparseable(String),

    #[error("Classifier timed out after {0}ms")]
    Timeout(u64),

    #[error("Classifier backend error: {0}")]
    Backend(String),
}

/// Internal routing failure. Recovered by handing off to the general agent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingDegradationError {
    #[error("Non-finite score for agent {agent}")]
    NonFiniteScore { agent: String },

    #[error("Invalid sentiment input: {0}")]
    InvalidSentiment(String),

    #[error("Agent registry is empty")]
    EmptyRegistry,

    #[error("Handoff agent is missing from the registry")]
    MissingHandoffAgent,
}

/// Template selection or binding failure. Recovered with the default template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateBindingError {
    #[error("No active {template_type} template for agent {agent}")]
    NoMatchingTemplate {
        agent: String,
        template_type: String,
    },

    #[error("Template {template_id} is missing required variables: {}", missing.join(", "))]
    MissingVariables {
        template_id: String,
        missing: Vec<String>,
    },

    #[error("Template {template_id} has unresolved placeholders: {}", placeholders.join(", "))]
    UnresolvedPlaceholders {
        template_id: String,
        placeholders: Vec<String>,
    },
}

/// Illegal escalation transition request. Logged and ignored.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Illegal escalation transition for {conversation_id}: {request} while {from}")]
pub struct EscalationTransitionError {
    pub conversation_id: String,
    pub from: EscalationStatus,
    pub request: String,
}

/// Crate-wide error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Routing(#[from] RoutingDegradationError),

    #[error(transparent)]
    TemplateBinding(#[from] TemplateBindingError),

    #[error(transparent)]
    EscalationTransition(#[from] EscalationTransitionError),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Context store error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
