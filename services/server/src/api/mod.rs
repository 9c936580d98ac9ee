//! HTTP API
//!
//! axum router exposing the deployment lifecycle and the proxied runtime
//! surface. Responses use a `{success, data, error}` envelope, except
//! container errors, which pass through verbatim.

pub mod deployments;
pub mod error;
pub mod proxy;
pub mod types;

use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::orchestrator::service::Orchestrator;

use self::types::ApiEnvelope;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub gateway: Arc<Gateway>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/agents/:agent_id/deploy", post(deployments::deploy))
        .route("/api/agents/:agent_id/deployments", get(deployments::list))
        .route(
            "/api/agents/:agent_id/deployment/active",
            get(deployments::active),
        )
        .route("/api/deployments/stop-all", post(deployments::stop_all))
        .route("/api/deployments/:deployment_id", get(deployments::status))
        .route("/api/deployments/:deployment_id/stop", post(deployments::stop))
        .route(
            "/api/deployments/:deployment_id/health",
            get(proxy::runtime_health),
        )
        .route("/api/deployments/:deployment_id/chat", post(proxy::chat))
        .route("/api/deployments/:deployment_id/ws", get(proxy::chat_stream))
        .route(
            "/api/deployments/:deployment_id/working-memory",
            get(proxy::working_memory)
                .post(proxy::inject_working_memory)
                .delete(proxy::clear_working_memory),
        )
        .with_state(state)
}

async fn health() -> Json<ApiEnvelope<serde_json::Value>> {
    Json(ApiEnvelope::ok(serde_json::json!({ "status": "ok" })))
}
