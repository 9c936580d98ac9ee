//! Working-memory forwarding
//!
//! Thin forwards to the running instance's working-memory endpoints with
//! response reshaping. Nothing is stored on this side: entries live in
//! the container process and are lost when it stops, which is intentional.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::gateway::{Gateway, GatewayError};

/// Bound on working-memory forwards
pub const MEMORY_TIMEOUT: Duration = Duration::from_secs(30);

/// Client-facing working-memory view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemoryView {
    /// System-managed entries; reserved, currently always empty
    pub items: Vec<serde_json::Value>,
    pub user_injected: Vec<InjectedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectedEntry {
    pub id: String,
    pub content: String,
    pub source: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Wire shape of the runtime's working-memory responses
#[derive(Debug, Deserialize)]
struct RuntimeMemoryState {
    #[serde(default)]
    entries: Vec<RuntimeMemoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RuntimeMemoryEntry {
    #[allow(dead_code)]
    name: String,
    content: String,
}

impl Gateway {
    /// List the deployment's current working-memory entries
    pub async fn working_memory(&self, id: Uuid) -> Result<WorkingMemoryView, GatewayError> {
        let (_, endpoint) = self.resolve(id)?;

        let response = self
            .http
            .get(format!("http://{}/working-memory", endpoint))
            .timeout(MEMORY_TIMEOUT)
            .send()
            .await
            .map_err(Self::connection_error)?;

        let state = Self::parse_memory_state(response).await?;
        Ok(reshape(id, state))
    }

    /// Inject a named entry; an existing entry with the same name is
    /// replaced by the runtime (last write wins)
    pub async fn inject_working_memory(
        &self,
        id: Uuid,
        content: String,
        name: Option<String>,
    ) -> Result<WorkingMemoryView, GatewayError> {
        let (_, endpoint) = self.resolve(id)?;

        let mut payload = serde_json::json!({ "content": content });
        if let Some(name) = name {
            payload["name"] = serde_json::Value::String(name);
        }

        let response = self
            .http
            .post(format!("http://{}/inject-context", endpoint))
            .timeout(MEMORY_TIMEOUT)
            .json(&payload)
            .send()
            .await
            .map_err(Self::connection_error)?;

        let state = Self::parse_memory_state(response).await?;
        Ok(reshape(id, state))
    }

    /// Clear all working-memory entries
    pub async fn clear_working_memory(&self, id: Uuid) -> Result<WorkingMemoryView, GatewayError> {
        let (_, endpoint) = self.resolve(id)?;

        let response = self
            .http
            .delete(format!("http://{}/working-memory", endpoint))
            .timeout(MEMORY_TIMEOUT)
            .send()
            .await
            .map_err(Self::connection_error)?;

        Self::check_response(response).await?;
        Ok(WorkingMemoryView {
            items: Vec::new(),
            user_injected: Vec::new(),
        })
    }

    async fn parse_memory_state(
        response: reqwest::Response,
    ) -> Result<RuntimeMemoryState, GatewayError> {
        let response = Self::check_response(response).await?;
        response.json().await.map_err(Self::connection_error)
    }
}

fn reshape(deployment_id: Uuid, state: RuntimeMemoryState) -> WorkingMemoryView {
    let user_injected = state
        .entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| InjectedEntry {
            id: format!("{}-{}", deployment_id, index),
            content: entry.content,
            source: "user".to_string(),
            created_at: None,
        })
        .collect();

    WorkingMemoryView {
        items: Vec::new(),
        user_injected,
    }
}
