//! Proxied runtime handlers
//!
//! Chat, streaming, and working-memory endpoints that forward into the
//! running deployment through the gateway.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;
use uuid::Uuid;

use crate::gateway::chat::{ChatReply, ChatRequest};
use crate::gateway::memory::WorkingMemoryView;
use crate::gateway::stream;

use super::error::ApiError;
use super::types::{ApiEnvelope, InjectRequest};
use super::AppState;

/// POST /api/deployments/:deployment_id/chat
pub async fn chat(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiEnvelope<ChatReply>>, ApiError> {
    let reply = state.gateway.chat(deployment_id, body).await?;
    Ok(Json(ApiEnvelope::ok(reply)))
}

/// GET /api/deployments/:deployment_id/ws
pub async fn chat_stream(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
    upgrade: WebSocketUpgrade,
) -> Response {
    // Resolve before upgrading so a stopped deployment yields an HTTP
    // error instead of a socket that opens and immediately dies
    let endpoint = match state.gateway.resolve(deployment_id) {
        Ok((_, endpoint)) => endpoint,
        Err(err) => return ApiError::from(err).into_response(),
    };

    upgrade.on_upgrade(move |socket| async move {
        if let Err(err) = stream::bridge(socket, &endpoint).await {
            warn!(
                deployment_id = %deployment_id,
                error = %err,
                "Streaming session ended with error"
            );
        }
    })
}

/// GET /api/deployments/:deployment_id/health
pub async fn runtime_health(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>, ApiError> {
    let health = state.gateway.runtime_health(deployment_id).await?;
    Ok(Json(ApiEnvelope::ok(health)))
}

/// GET /api/deployments/:deployment_id/working-memory
pub async fn working_memory(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<WorkingMemoryView>>, ApiError> {
    let view = state.gateway.working_memory(deployment_id).await?;
    Ok(Json(ApiEnvelope::ok(view)))
}

/// POST /api/deployments/:deployment_id/working-memory
pub async fn inject_working_memory(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
    Json(body): Json<InjectRequest>,
) -> Result<Json<ApiEnvelope<WorkingMemoryView>>, ApiError> {
    if body.content.is_empty() {
        return Err(ApiError::bad_request(
            "CONTENT_REQUIRED",
            "content must not be empty".to_string(),
        ));
    }
    let view = state
        .gateway
        .inject_working_memory(deployment_id, body.content, body.name)
        .await?;
    Ok(Json(ApiEnvelope::ok(view)))
}

/// DELETE /api/deployments/:deployment_id/working-memory
pub async fn clear_working_memory(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<WorkingMemoryView>>, ApiError> {
    let view = state.gateway.clear_working_memory(deployment_id).await?;
    Ok(Json(ApiEnvelope::ok(view)))
}
