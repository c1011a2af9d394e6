//! HTTP Endpoints
//!
//! REST API for routing messages, rendering replies and operating on
//! escalations.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use dealer_agent_config::ClassifierBackend;
use dealer_agent_core::{Message, RenderedTemplate, RoutingDecision, TemplateType};
use dealer_agent_tools::{ToolError, ToolExecutor};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        // Routing
        .route("/api/messages", post(route_message))
        .route("/api/replies", post(render_reply))
        // Escalation
        .route("/api/conversations/:id/escalation", get(get_escalation))
        .route(
            "/api/conversations/:id/escalation/acknowledge",
            post(acknowledge_escalation),
        )
        // Diagnostics
        .route("/api/customers/:id/context", get(get_customer_context))
        .route("/api/agents", get(list_agents))
        // Tool endpoints
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(call_tool))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins
///
/// Disabled means permissive. Invalid origins are skipped; if none survive,
/// only localhost:3000 is allowed.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    let parsed_origins = if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_CORS_ORIGIN);
        vec![HeaderValue::from_static(DEFAULT_CORS_ORIGIN)]
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
        parsed_origins
    };

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Inbound message
///
/// `id` is optional; redeliveries should reuse the id of the first attempt so
/// they are answered from the dedup window.
#[derive(Debug, Deserialize)]
struct RouteMessageRequest {
    id: Option<String>,
    conversation_id: String,
    customer_id: String,
    text: String,
    received_at: Option<DateTime<Utc>>,
}

impl RouteMessageRequest {
    fn into_message(self) -> Result<Message, ServerError> {
        if self.conversation_id.trim().is_empty() {
            return Err(ServerError::InvalidRequest("conversation_id is required".to_string()));
        }
        if self.customer_id.trim().is_empty() {
            return Err(ServerError::InvalidRequest("customer_id is required".to_string()));
        }

        let mut message = Message::new(self.conversation_id, self.customer_id, self.text);
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            message = message.with_id(id);
        }
        if let Some(at) = self.received_at {
            message = message.received_at(at);
        }
        Ok(message)
    }
}

async fn route_message(
    State(state): State<AppState>,
    Json(request): Json<RouteMessageRequest>,
) -> Result<Json<RoutingDecision>, StatusCode> {
    let message = request.into_message().map_err(|e| {
        tracing::debug!(error = %e, "Rejected message");
        StatusCode::from(e)
    })?;
    Ok(Json(state.router.route_message(message).await))
}

#[derive(Debug, Deserialize)]
struct RenderReplyRequest {
    decision: RoutingDecision,
    template_type: TemplateType,
    #[serde(default)]
    lead_source_tags: BTreeSet<String>,
    #[serde(default)]
    variables: HashMap<String, String>,
}

async fn render_reply(
    State(state): State<AppState>,
    Json(request): Json<RenderReplyRequest>,
) -> Json<RenderedTemplate> {
    Json(state.router.select_template(
        &request.decision,
        &request.lead_source_tags,
        request.template_type,
        &request.variables,
    ))
}

async fn get_escalation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Json<serde_json::Value> {
    let current = state.router.get_escalation_state(&conversation_id);
    let history = state.router.get_escalation_history(&conversation_id);
    Json(serde_json::json!({
        "state": current,
        "history": history,
    }))
}

/// Operator acknowledgement. Only an escalated conversation can be
/// acknowledged; anything else is a 409 carrying the unchanged state.
async fn acknowledge_escalation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    let outcome = state.router.acknowledge_escalation(&conversation_id);
    let status = if outcome.applied {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(serde_json::json!(outcome)))
}

async fn get_customer_context(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.router.get_customer_context(&customer_id).await {
        Ok(Some(context)) => Ok(Json(serde_json::json!(context))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(customer_id = %customer_id, error = %e, "Context lookup failed");
            Err(StatusCode::from(ServerError::from(e)))
        }
    }
}

async fn list_agents(State(state): State<AppState>) -> Json<serde_json::Value> {
    let agents = state.router.get_agent_registry_snapshot();
    Json(serde_json::json!({
        "count": agents.len(),
        "agents": agents,
    }))
}

async fn list_tools(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tools: Vec<serde_json::Value> = state
        .tools
        .list_tools()
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect();

    Json(serde_json::json!({
        "tools": tools,
    }))
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Call tool
///
/// Unknown tools are a 404. Other tool failures come back as an
/// `is_error` payload so callers can surface the message.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ToolCallRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.tools.execute(&name, request.arguments).await {
        Ok(output) => Ok(Json(serde_json::json!({
            "content": output.content,
            "is_error": output.is_error,
            "reply_fragment": output.as_reply_fragment(),
        }))),
        Err(ToolError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!(tool = %name, error = %e, "Tool call failed");
            Ok(Json(serde_json::json!({
                "content": [{ "type": "text", "text": e.to_string() }],
                "is_error": true,
            })))
        }
    }
}

/// Liveness plus a summary of what was loaded at startup
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut checks = serde_json::Map::new();
    let mut all_healthy = true;

    let agents = state.router.get_agent_registry_snapshot();
    let has_handoff = agents
        .iter()
        .any(|a| a.agent_id == dealer_agent_core::AgentKind::General);
    if !has_handoff {
        all_healthy = false;
    }
    checks.insert(
        "agents".to_string(),
        serde_json::json!({
            "status": if has_handoff { "ok" } else { "missing_handoff" },
            "count": agents.len()
        }),
    );

    let tool_count = state.tools.len();
    checks.insert(
        "tools".to_string(),
        serde_json::json!({
            "status": if tool_count > 0 { "ok" } else { "degraded" },
            "count": tool_count
        }),
    );

    checks.insert(
        "classifier".to_string(),
        serde_json::json!({
            "status": "ok",
            "model_version": state.router.classifier_model_version()
        }),
    );

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if all_healthy { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "checks": checks
        })),
    )
}

/// Ready when the configured classifier backend can be reached
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut checks = serde_json::Map::new();
    let mut ready = true;

    let classifier = &state.config.classifier;
    let classifier_status = match (classifier.backend, classifier.endpoint.as_deref()) {
        (ClassifierBackend::Http, Some(endpoint)) => {
            // Any HTTP response means the backend is reachable
            match tokio::time::timeout(Duration::from_secs(2), reqwest::get(endpoint)).await {
                Ok(Ok(resp)) if !resp.status().is_server_error() => "ok",
                Ok(Ok(_)) => {
                    ready = false;
                    "error"
                }
                Ok(Err(_)) => {
                    ready = false;
                    "unreachable"
                }
                Err(_) => {
                    ready = false;
                    "timeout"
                }
            }
        }
        (ClassifierBackend::Http, None) => {
            ready = false;
            "misconfigured"
        }
        (ClassifierBackend::Lexicon, _) => "ok",
    };
    checks.insert(
        "classifier".to_string(),
        serde_json::json!({
            "status": classifier_status,
            "backend": classifier.backend,
        }),
    );

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": ready,
            "checks": checks
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dealer_agent_agent::{AgentRegistry, RoutingService, StaticTemplateCatalog};
    use dealer_agent_config::{AgentRegistryConfig, Settings, TemplateCatalogConfig};
    use dealer_agent_text_processing::LexiconClassifier;
    use dealer_agent_tools::{create_inventory_registry, InMemoryInventory};
    use std::sync::Arc;
    use tower::ServiceExt;

    const AGENTS: &str = include_str!("../../../config/agents.yaml");
    const TEMPLATES: &str = include_str!("../../../config/templates.yaml");

    fn test_state() -> AppState {
        let registry =
            AgentRegistry::from_config(AgentRegistryConfig::from_yaml(AGENTS).unwrap()).unwrap();
        let catalog =
            StaticTemplateCatalog::from_config(TemplateCatalogConfig::from_yaml(TEMPLATES).unwrap())
                .unwrap();
        let router = RoutingService::new(
            Arc::new(registry),
            Arc::new(catalog),
            Arc::new(LexiconClassifier::new()),
        );
        let tools = create_inventory_registry(Arc::new(InMemoryInventory::sample()));
        AppState::new(Settings::default(), router, tools)
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    #[test]
    fn test_router_creation() {
        let _router = create_router(test_state());
    }

    #[tokio::test]
    async fn test_route_inventory_message() {
        let app = create_router(test_state());
        let (status, body) = send(
            app,
            Method::POST,
            "/api/messages",
            Some(serde_json::json!({
                "id": "m-1",
                "conversation_id": "conv-1",
                "customer_id": "cust-1",
                "text": "What's the MSRP on the 2024 Highlander?"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_id"], "m-1");
        assert_eq!(body["selected_agent_id"], "inventory");
        assert_eq!(body["escalate"], false);
    }

    #[tokio::test]
    async fn test_blank_customer_rejected() {
        let app = create_router(test_state());
        let (status, _) = send(
            app,
            Method::POST,
            "/api/messages",
            Some(serde_json::json!({
                "conversation_id": "conv-1",
                "customer_id": "  ",
                "text": "hello"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_render_reply_falls_back_without_variables() {
        let state = test_state();
        let decision = state
            .router
            .route_message(Message::new("conv-2", "cust-2", "What financing options do you have"))
            .await;

        let (status, body) = send(
            create_router(state),
            Method::POST,
            "/api/replies",
            Some(serde_json::json!({
                "decision": decision,
                "template_type": "followup",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["template_id"], "default-ack");
        assert!(!body["fallback_reason"].is_null());
        assert!(!body["text"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledge_requires_escalation() {
        let app = create_router(test_state());
        let (status, body) = send(
            app,
            Method::POST,
            "/api/conversations/conv-9/escalation/acknowledge",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["applied"], false);
        assert_eq!(body["state"]["status"], "normal");
    }

    #[tokio::test]
    async fn test_acute_message_escalates_and_acknowledges() {
        let state = test_state();
        let app = create_router(state.clone());
        let (_, decision) = send(
            app.clone(),
            Method::POST,
            "/api/messages",
            Some(serde_json::json!({
                "conversation_id": "conv-3",
                "customer_id": "cust-3",
                "text": "I am furious, this is the third time!"
            })),
        )
        .await;
        assert_eq!(decision["escalate"], true);

        let (status, body) =
            send(app.clone(), Method::GET, "/api/conversations/conv-3/escalation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["status"], "watch");

        // A second signal inside the window escalates
        send(
            app.clone(),
            Method::POST,
            "/api/messages",
            Some(serde_json::json!({
                "conversation_id": "conv-3",
                "customer_id": "cust-3",
                "text": "I am furious, nobody has called me back!"
            })),
        )
        .await;

        let (status, body) = send(
            app,
            Method::POST,
            "/api/conversations/conv-3/escalation/acknowledge",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applied"], true);
        assert_eq!(body["state"]["status"], "resolved");
    }

    #[tokio::test]
    async fn test_customer_context_lookup() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, _) = send(app.clone(), Method::GET, "/api/customers/nobody/context", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state
            .router
            .route_message(Message::new("conv-4", "cust-4", "I need an oil change"))
            .await;
        let (status, body) = send(app, Method::GET, "/api/customers/cust-4/context", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["customer_id"], "cust-4");
        assert_eq!(body["message_count"], 1);
    }

    #[tokio::test]
    async fn test_list_agents() {
        let app = create_router(test_state());
        let (status, body) = send(app, Method::GET, "/api/agents", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 8);
    }

    #[tokio::test]
    async fn test_tools_endpoints() {
        let app = create_router(test_state());
        let (status, body) = send(app.clone(), Method::GET, "/api/tools", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"].as_array().unwrap().len(), 2);
        assert_eq!(body["tools"][0]["name"], "check_availability");

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/tools/search_inventory",
            Some(serde_json::json!({ "arguments": { "model": "Highlander" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_error"], false);
        assert!(body["reply_fragment"].as_str().unwrap().contains("Highlander"));

        let (status, _) = send(
            app,
            Method::POST,
            "/api/tools/book_flight",
            Some(serde_json::json!({ "arguments": {} })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_readiness() {
        let app = create_router(test_state());
        let (status, body) = send(app.clone(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"]["agents"]["count"], 8);

        let (status, body) = send(app, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
    }

    #[test]
    fn test_cors_layer_survives_bad_origins() {
        let _layer = build_cors_layer(&["not a header\u{7f}".to_string()], true);
        let _layer = build_cors_layer(&[], true);
        let _layer = build_cors_layer(&[], false);
    }
}
