//! Deployment lifecycle handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::orchestrator::service::{DeploymentStatusView, StopAllReport};
use crate::orchestrator::state::DeploymentStatus;
use crate::orchestrator::store::Deployment;

use super::error::ApiError;
use super::types::{ApiEnvelope, DeployRequest, ListQuery, DEFAULT_LIST_LIMIT};
use super::AppState;

/// POST /api/agents/:agent_id/deploy
pub async fn deploy(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
    Json(body): Json<DeployRequest>,
) -> Result<Json<ApiEnvelope<Deployment>>, ApiError> {
    let deployment = state
        .orchestrator
        .deploy(agent_id, body.version_id, None)
        .await?;
    Ok(Json(ApiEnvelope::ok(deployment)))
}

/// GET /api/agents/:agent_id/deployments
pub async fn list(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiEnvelope<Vec<Deployment>>>, ApiError> {
    let status = parse_status(query.status.as_deref())?;
    let deployments = state.orchestrator.list(
        Some(agent_id),
        status,
        query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
    );
    Ok(Json(ApiEnvelope::ok(deployments)))
}

/// GET /api/agents/:agent_id/deployment/active
pub async fn active(
    State(state): State<AppState>,
    Path(agent_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<Option<DeploymentStatusView>>>, ApiError> {
    let Some(deployment) = state.orchestrator.active(agent_id) else {
        return Ok(Json(ApiEnvelope::ok(None)));
    };
    let view = state.orchestrator.status(deployment.id).await?;
    Ok(Json(ApiEnvelope::ok(Some(view))))
}

/// GET /api/deployments/:deployment_id
pub async fn status(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<DeploymentStatusView>>, ApiError> {
    let view = state.orchestrator.status(deployment_id).await?;
    Ok(Json(ApiEnvelope::ok(view)))
}

/// POST /api/deployments/:deployment_id/stop
pub async fn stop(
    State(state): State<AppState>,
    Path(deployment_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<Deployment>>, ApiError> {
    let deployment = state.orchestrator.stop(deployment_id).await?;
    Ok(Json(ApiEnvelope::ok(deployment)))
}

/// POST /api/deployments/stop-all
pub async fn stop_all(
    State(state): State<AppState>,
) -> Result<Json<ApiEnvelope<StopAllReport>>, ApiError> {
    let report = state.orchestrator.stop_all().await;
    Ok(Json(ApiEnvelope::ok(report)))
}

fn parse_status(raw: Option<&str>) -> Result<Option<DeploymentStatus>, ApiError> {
    raw.map(|s| {
        s.parse::<DeploymentStatus>()
            .map_err(|e| ApiError::bad_request("INVALID_STATUS", e))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(
            parse_status(Some("running")).unwrap(),
            Some(DeploymentStatus::Running)
        );
        assert!(parse_status(Some("bogus")).is_err());
    }
}
