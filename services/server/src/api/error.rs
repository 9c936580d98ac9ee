//! API error mapping
//!
//! Translates domain errors into HTTP responses. Everything renders as an
//! enveloped error except runtime pass-through, which forwards the
//! container's status and body untouched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::catalog::CatalogError;
use crate::gateway::GatewayError;
use crate::orchestrator::service::OrchestratorError;
use crate::runtime::adapter::EngineError;

use super::types::ApiEnvelope;

#[derive(Debug)]
pub enum ApiError {
    Enveloped {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
    /// Verbatim body from the running instance
    Passthrough { status: StatusCode, body: String },
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self::Enveloped {
            status,
            code,
            message,
        }
    }

    pub fn bad_request(code: &'static str, message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Enveloped {
                status,
                code,
                message,
            } => {
                let envelope = ApiEnvelope::<()>::err(code, message);
                (status, Json(envelope)).into_response()
            }
            ApiError::Passthrough { status, body } => (status, body).into_response(),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let message = err.to_string();
        match err {
            OrchestratorError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "DEPLOYMENT_NOT_FOUND", message)
            }
            OrchestratorError::InvalidState { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_STATE", message)
            }
            OrchestratorError::Catalog(CatalogError::UnknownVersion(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "UNKNOWN_VERSION", message)
            }
            OrchestratorError::Catalog(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "CATALOG_ERROR", message)
            }
            OrchestratorError::Engine(EngineError::Unavailable(_)) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "ENGINE_UNAVAILABLE", message)
            }
            OrchestratorError::Engine(EngineError::NotFound(_)) => {
                Self::new(StatusCode::NOT_FOUND, "CONTAINER_NOT_FOUND", message)
            }
            OrchestratorError::Engine(EngineError::OperationFailed(_)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_ERROR", message)
            }
            OrchestratorError::Store(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", message)
            }
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "DEPLOYMENT_NOT_FOUND", message)
            }
            GatewayError::NotRunning { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "NOT_RUNNING", message)
            }
            GatewayError::NoEndpoint => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "NO_ENDPOINT", message)
            }
            GatewayError::Runtime { status, body } => Self::Passthrough {
                status: StatusCode::from_u16(status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body,
            },
            GatewayError::Unreachable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "RUNTIME_UNREACHABLE", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::state::DeploymentStatus;

    #[test]
    fn test_invalid_state_maps_to_bad_request() {
        let err = ApiError::from(OrchestratorError::InvalidState {
            current: DeploymentStatus::Stopped,
        });
        match err {
            ApiError::Enveloped { status, code, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(code, "INVALID_STATE");
                assert!(message.contains("stopped"));
            }
            ApiError::Passthrough { .. } => panic!("expected enveloped error"),
        }
    }

    #[test]
    fn test_runtime_error_passes_body_through() {
        let err = ApiError::from(GatewayError::Runtime {
            status: 422,
            body: "{\"detail\": \"bad input\"}".to_string(),
        });
        match err {
            ApiError::Passthrough { status, body } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert!(body.contains("bad input"));
            }
            ApiError::Enveloped { .. } => panic!("expected pass-through"),
        }
    }

    #[test]
    fn test_engine_unavailable_maps_to_503() {
        let err = ApiError::from(OrchestratorError::Engine(EngineError::Unavailable(
            "socket closed".to_string(),
        )));
        match err {
            ApiError::Enveloped { status, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            ApiError::Passthrough { .. } => panic!("expected enveloped error"),
        }
    }
}
