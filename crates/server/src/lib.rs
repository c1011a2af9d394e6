//! Dealer Agent Server
//!
//! HTTP surface over the routing service: message routing, reply rendering,
//! escalation inspection and acknowledgement, registry snapshots, inventory
//! tools, health and Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler};
pub use state::AppState;

use dealer_agent_agent::AgentError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Initialization(msg) => ServerError::Initialization(msg),
            AgentError::Config(e) => ServerError::Initialization(e.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Initialization(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
