//! Chat forwarding
//!
//! Single request/response chat against a running deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::gateway::{Gateway, GatewayError};

/// Model turns can be slow; bound a single chat forward at two minutes
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Bound on health probes of the running instance
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
}

impl Gateway {
    /// Forward one chat message to the deployment's container.
    ///
    /// Fails with a "not running" condition before any network call when
    /// the deployment is not RUNNING. A non-2xx answer from the container
    /// is passed through verbatim; a connection failure surfaces as a
    /// distinct unreachable condition.
    pub async fn chat(&self, id: Uuid, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        let (_, endpoint) = self.resolve(id)?;
        let conversation_id = request
            .conversation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let response = self
            .http
            .post(format!("http://{}/chat", endpoint))
            .timeout(CHAT_TIMEOUT)
            .json(&serde_json::json!({
                "message": request.message,
                "conversation_id": conversation_id,
            }))
            .send()
            .await
            .map_err(Self::connection_error)?;

        let response = Self::check_response(response).await?;
        response.json().await.map_err(Self::connection_error)
    }

    /// Probe the running instance's own health endpoint
    pub async fn runtime_health(&self, id: Uuid) -> Result<serde_json::Value, GatewayError> {
        let (_, endpoint) = self.resolve(id)?;

        let response = self
            .http
            .get(format!("http://{}/health", endpoint))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(Self::connection_error)?;

        let response = Self::check_response(response).await?;
        response.json().await.map_err(Self::connection_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::orchestrator::state::DeploymentStatus;
    use crate::orchestrator::store::{Deployment, DeploymentStore};

    #[tokio::test]
    async fn test_chat_against_stopped_deployment_makes_no_network_call() {
        let store = Arc::new(DeploymentStore::in_memory());
        let deployment = Deployment::new(Uuid::new_v4(), Uuid::new_v4(), None);
        let id = deployment.id;
        store.insert(deployment);
        for status in [
            DeploymentStatus::Building,
            DeploymentStatus::Starting,
            DeploymentStatus::Running,
            DeploymentStatus::Stopping,
            DeploymentStatus::Stopped,
        ] {
            store.transition(id, status, |_| {}).unwrap();
        }

        // No endpoint was ever assigned, so any network attempt would fail
        // with a different error kind than the one asserted here.
        let gateway = Gateway::new(store);
        let err = gateway
            .chat(
                id,
                ChatRequest {
                    message: "hello".to_string(),
                    conversation_id: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::NotRunning {
                current: DeploymentStatus::Stopped
            }
        ));
    }
}
