//! Prometheus metrics
//!
//! The recorder is process-global. Routing code emits through the `metrics`
//! macros whether or not a recorder is installed.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Calling it again returns the same handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    HANDLE
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe();
            Ok(handle)
        })
        .cloned()
}

fn describe() {
    metrics::describe_counter!("routing_decisions_total", "Routing decisions by agent");
    metrics::describe_counter!("routing_escalations_total", "Escalate decisions by reason");
    metrics::describe_counter!(
        "routing_degradations_total",
        "Decisions that fell back to the general agent after an internal error"
    );
    metrics::describe_counter!(
        "routing_duplicates_total",
        "Redelivered messages answered from the dedup window"
    );
    metrics::describe_counter!(
        "classifier_fallbacks_total",
        "Neutral sentiment substituted for the classifier, by cause"
    );
    metrics::describe_counter!("template_fallbacks_total", "Replies rendered from the default template");
    metrics::describe_counter!("pipeline_errors_total", "Recovered collaborator failures by stage");
    metrics::describe_histogram!("routing_latency_ms", "End to end routing latency");
}

/// `GET /metrics`
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics disabled\n".to_string(),
        ),
    }
}
