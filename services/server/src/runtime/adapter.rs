//! Engine Adapter Trait
//!
//! Defines the interface to the external container engine. Implementations
//! are the sole owner of the engine connection and normalize every
//! engine-specific failure into one of three kinds so callers match on
//! kind, never on engine exception classes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::compiler::manifest::Manifest;

/// Engine failures, normalized
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced image or container does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The engine itself could not be reached
    #[error("container engine unavailable: {0}")]
    Unavailable(String),

    /// The engine was reachable but rejected the request
    #[error("container engine operation failed: {0}")]
    OperationFailed(String),
}

/// Read-only container health snapshot from the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHealth {
    pub status: String,
    pub running: bool,
    pub health: String,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

impl ContainerHealth {
    /// Snapshot for a container the engine no longer knows about
    pub fn missing() -> Self {
        Self {
            status: "not_found".to_string(),
            running: false,
            health: "unknown".to_string(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Interface to the external container engine
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Engine type name
    fn engine_type(&self) -> &str;

    /// Check that the engine is reachable
    async fn ping(&self) -> Result<(), EngineError>;

    /// Build an image from the runtime bootstrap plus the serialized
    /// manifest, tagged deterministically from the agent and version ids.
    /// Returns the opaque image reference.
    async fn build_image(
        &self,
        agent_id: Uuid,
        version_id: Uuid,
        manifest: &Manifest,
    ) -> Result<String, EngineError>;

    /// Create and start a detached container from an image, binding the
    /// runtime port to an engine-assigned host port. Returns the opaque
    /// container reference and the assigned host port.
    async fn create_container(
        &self,
        image_ref: &str,
        name: &str,
    ) -> Result<(String, u16), EngineError>;

    /// Stop a container gracefully. "Already gone" is success.
    async fn stop_container(&self, container_ref: &str) -> Result<(), EngineError>;

    /// Remove a container, forcing if needed. "Already gone" is success.
    async fn remove_container(&self, container_ref: &str) -> Result<(), EngineError>;

    /// Read the live container state. Must not mutate anything the
    /// orchestrator can observe.
    async fn status(&self, container_ref: &str) -> Result<ContainerHealth, EngineError>;
}
