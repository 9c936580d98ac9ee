//! Proxy Gateway
//!
//! Bridges client-facing chat, streaming, and working-memory traffic to
//! the network endpoint of the currently RUNNING deployment, without ever
//! exposing that endpoint to clients. The gateway itself stores nothing:
//! working memory is process-local state of the running instance and dies
//! with it.

pub mod chat;
pub mod memory;
pub mod stream;

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::orchestrator::state::DeploymentStatus;
use crate::orchestrator::store::{Deployment, DeploymentStore, Endpoint};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("deployment {0} not found")]
    NotFound(Uuid),

    #[error("deployment is not running (status: {current})")]
    NotRunning { current: DeploymentStatus },

    #[error("deployment has no assigned endpoint")]
    NoEndpoint,

    /// The running instance answered with a non-2xx; its body is passed
    /// through verbatim
    #[error("agent runtime returned status {status}")]
    Runtime { status: u16, body: String },

    #[error("failed to reach agent runtime: {0}")]
    Unreachable(String),
}

/// Routes client traffic into running agent containers
pub struct Gateway {
    store: Arc<DeploymentStore>,
    http: reqwest::Client,
}

impl Gateway {
    pub fn new(store: Arc<DeploymentStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Resolve a deployment to its live endpoint. Fails without any
    /// network call when the deployment is not RUNNING or has no endpoint.
    pub fn resolve(&self, id: Uuid) -> Result<(Deployment, Endpoint), GatewayError> {
        let deployment = self.store.get(id).ok_or(GatewayError::NotFound(id))?;

        if deployment.status != DeploymentStatus::Running {
            return Err(GatewayError::NotRunning {
                current: deployment.status,
            });
        }

        let endpoint = deployment
            .endpoint
            .clone()
            .ok_or(GatewayError::NoEndpoint)?;
        Ok((deployment, endpoint))
    }

    fn connection_error(err: reqwest::Error) -> GatewayError {
        GatewayError::Unreachable(err.to_string())
    }

    /// Map a runtime response to pass-through or parsed output
    async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Runtime {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_deployment() {
        let gateway = Gateway::new(Arc::new(DeploymentStore::in_memory()));
        let id = Uuid::new_v4();

        let err = gateway.resolve(id).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(d) if d == id));
    }

    #[test]
    fn test_resolve_requires_running() {
        let store = Arc::new(DeploymentStore::in_memory());
        let deployment = Deployment::new(Uuid::new_v4(), Uuid::new_v4(), None);
        let id = deployment.id;
        store.insert(deployment);
        store
            .transition(id, DeploymentStatus::Building, |_| {})
            .unwrap();
        store
            .transition(id, DeploymentStatus::Failed, |_| {})
            .unwrap();

        let gateway = Gateway::new(store);
        let err = gateway.resolve(id).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::NotRunning {
                current: DeploymentStatus::Failed
            }
        ));
    }

    #[test]
    fn test_resolve_requires_endpoint() {
        let store = Arc::new(DeploymentStore::in_memory());
        let deployment = Deployment::new(Uuid::new_v4(), Uuid::new_v4(), None);
        let id = deployment.id;
        store.insert(deployment);
        store
            .transition(id, DeploymentStatus::Building, |_| {})
            .unwrap();
        store
            .transition(id, DeploymentStatus::Starting, |_| {})
            .unwrap();
        store
            .transition(id, DeploymentStatus::Running, |_| {})
            .unwrap();

        let gateway = Gateway::new(store);
        assert!(matches!(
            gateway.resolve(id).unwrap_err(),
            GatewayError::NoEndpoint
        ));
    }

    #[test]
    fn test_resolve_returns_endpoint() {
        let store = Arc::new(DeploymentStore::in_memory());
        let deployment = Deployment::new(Uuid::new_v4(), Uuid::new_v4(), None);
        let id = deployment.id;
        store.insert(deployment);
        store
            .transition(id, DeploymentStatus::Building, |_| {})
            .unwrap();
        store
            .transition(id, DeploymentStatus::Starting, |_| {})
            .unwrap();
        store
            .transition(id, DeploymentStatus::Running, |d| {
                d.endpoint = Some(Endpoint {
                    host: "127.0.0.1".to_string(),
                    port: 49153,
                });
            })
            .unwrap();

        let gateway = Gateway::new(store);
        let (_, endpoint) = gateway.resolve(id).unwrap();
        assert_eq!(endpoint.to_string(), "127.0.0.1:49153");
    }
}
