//! Deployment lifecycle service
//!
//! Sequences compile, image build, and container start for new
//! deployments, and drives teardown for running ones. Stopping existing
//! deployments before starting a new one is read-then-act: two concurrent
//! deploys for the same agent can both pass the scan before either flips
//! status. That window is accepted and documented rather than locked away.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogError, ComponentSource};
use crate::compiler;
use crate::orchestrator::state::DeploymentStatus;
use crate::orchestrator::store::{Deployment, DeploymentStore, Endpoint, StoreError};
use crate::runtime::adapter::{ContainerHealth, EngineAdapter, EngineError};

/// Persisted error messages are cut to this many characters
const ERROR_MESSAGE_LIMIT: usize = 1_000;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("deployment {0} not found")]
    NotFound(Uuid),

    #[error("deployment is not running (status: {current})")]
    InvalidState { current: DeploymentStatus },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persisted record merged with a live engine probe
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentStatusView {
    #[serde(flatten)]
    pub deployment: Deployment,
    pub container: Option<ContainerHealth>,
}

/// Outcome of a bulk stop sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct StopAllReport {
    pub stopped: usize,
    pub failed: usize,
    pub failures: Vec<StopFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopFailure {
    pub deployment_id: Uuid,
    pub agent_id: Uuid,
    pub error: String,
}

/// Orchestrates the full deployment lifecycle
pub struct Orchestrator {
    store: Arc<DeploymentStore>,
    engine: Arc<dyn EngineAdapter>,
    catalog: Arc<dyn ComponentSource>,
    container_host: String,
    model: String,
}

impl Orchestrator {
    pub fn new(
        store: Arc<DeploymentStore>,
        engine: Arc<dyn EngineAdapter>,
        catalog: Arc<dyn ComponentSource>,
        container_host: String,
        model: String,
    ) -> Self {
        Self {
            store,
            engine,
            catalog,
            container_host,
            model,
        }
    }

    /// Access the shared deployment store
    pub fn store(&self) -> Arc<DeploymentStore> {
        self.store.clone()
    }

    /// Deploy a configuration version as a container.
    ///
    /// Any existing RUNNING deployment for the agent is stopped first. The
    /// new record is persisted in Pending before any expensive work so it
    /// is externally observable from the start. Failures after that flip
    /// the record to Failed and re-raise.
    pub async fn deploy(
        &self,
        agent_id: Uuid,
        version_id: Uuid,
        requested_by: Option<Uuid>,
    ) -> Result<Deployment, OrchestratorError> {
        self.stop_superseded(agent_id).await;

        let deployment = Deployment::new(agent_id, version_id, requested_by);
        let id = deployment.id;
        self.store.insert(deployment);

        info!(
            deployment_id = %id,
            agent_id = %agent_id,
            version_id = %version_id,
            "Starting deployment"
        );

        match self.provision(id, agent_id, version_id).await {
            Ok(deployment) => {
                info!(
                    deployment_id = %id,
                    endpoint = ?deployment.endpoint,
                    "Deployment running"
                );
                Ok(deployment)
            }
            Err(err) => {
                error!(deployment_id = %id, error = %err, "Deployment failed");
                self.mark_failed(id, &err);
                Err(err)
            }
        }
    }

    async fn provision(
        &self,
        id: Uuid,
        agent_id: Uuid,
        version_id: Uuid,
    ) -> Result<Deployment, OrchestratorError> {
        self.store.transition(id, DeploymentStatus::Building, |_| {})?;

        let components = self.catalog.components(version_id).await?;
        let manifest = compiler::compile(&components, &self.model);
        debug!(
            deployment_id = %id,
            digest = %manifest.digest(),
            skills = manifest.skills.len(),
            tools = manifest.tools.len(),
            "Configuration compiled"
        );

        let image_ref = self
            .engine
            .build_image(agent_id, version_id, &manifest)
            .await?;
        let container_name = self
            .store
            .update(id, |d| d.image_ref = Some(image_ref.clone()))?
            .container_name();

        self.store.transition(id, DeploymentStatus::Starting, |_| {})?;

        let (container_ref, port) = self
            .engine
            .create_container(&image_ref, &container_name)
            .await?;
        let endpoint = Endpoint {
            host: self.container_host.clone(),
            port,
        };
        self.store.update(id, |d| {
            d.container_ref = Some(container_ref.clone());
            d.endpoint = Some(endpoint.clone());
        })?;

        let deployment = self.store.transition(id, DeploymentStatus::Running, |d| {
            d.started_at = Some(chrono::Utc::now());
        })?;
        Ok(deployment)
    }

    /// Stop a running deployment and remove its container.
    ///
    /// Teardown is idempotent: a container the engine no longer knows
    /// about still counts as stopped.
    pub async fn stop(&self, id: Uuid) -> Result<Deployment, OrchestratorError> {
        let deployment = self.store.get(id).ok_or(OrchestratorError::NotFound(id))?;

        if deployment.status != DeploymentStatus::Running {
            return Err(OrchestratorError::InvalidState {
                current: deployment.status,
            });
        }

        self.store.transition(id, DeploymentStatus::Stopping, |_| {})?;

        if let Some(container_ref) = deployment.container_ref.as_deref() {
            if let Err(err) = self.teardown(container_ref).await {
                error!(deployment_id = %id, error = %err, "Container teardown failed");
                let err = OrchestratorError::Engine(err);
                self.mark_failed(id, &err);
                return Err(err);
            }
        }

        let deployment = self.store.transition(id, DeploymentStatus::Stopped, |d| {
            d.stopped_at = Some(chrono::Utc::now());
        })?;
        info!(deployment_id = %id, "Deployment stopped");
        Ok(deployment)
    }

    async fn teardown(&self, container_ref: &str) -> Result<(), EngineError> {
        self.engine.stop_container(container_ref).await?;
        self.engine.remove_container(container_ref).await
    }

    /// Persisted fields plus a live engine probe when the deployment is
    /// RUNNING. A probe that reports the container missing is surfaced as
    /// such; the persisted status is returned unchanged.
    pub async fn status(&self, id: Uuid) -> Result<DeploymentStatusView, OrchestratorError> {
        let deployment = self.store.get(id).ok_or(OrchestratorError::NotFound(id))?;

        let container = match (&deployment.status, deployment.container_ref.as_deref()) {
            (DeploymentStatus::Running, Some(container_ref)) => {
                match self.engine.status(container_ref).await {
                    Ok(health) => Some(health),
                    Err(EngineError::NotFound(_)) => Some(ContainerHealth::missing()),
                    Err(err) => return Err(err.into()),
                }
            }
            _ => None,
        };

        Ok(DeploymentStatusView {
            deployment,
            container,
        })
    }

    /// Filtered, newest-first read
    pub fn list(
        &self,
        agent_id: Option<Uuid>,
        status: Option<DeploymentStatus>,
        limit: usize,
    ) -> Vec<Deployment> {
        self.store.list(agent_id, status, limit)
    }

    /// The RUNNING deployment for an agent, if any
    pub fn active(&self, agent_id: Uuid) -> Option<Deployment> {
        self.store.active(agent_id)
    }

    /// Stop every RUNNING deployment, one at a time to bound engine load.
    /// A failure stopping one never prevents attempting the rest.
    pub async fn stop_all(&self) -> StopAllReport {
        let running = self.store.list(None, Some(DeploymentStatus::Running), usize::MAX);
        let mut report = StopAllReport::default();

        for deployment in running {
            match self.stop(deployment.id).await {
                Ok(_) => report.stopped += 1,
                Err(err) => {
                    warn!(
                        deployment_id = %deployment.id,
                        error = %err,
                        "Failed to stop deployment during sweep"
                    );
                    report.failed += 1;
                    report.failures.push(StopFailure {
                        deployment_id: deployment.id,
                        agent_id: deployment.agent_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            stopped = report.stopped,
            failed = report.failed,
            "Stop sweep finished"
        );
        report
    }

    /// Best-effort stop of every RUNNING deployment for one agent before a
    /// new deployment starts. A failed stop leaves that record FAILED and
    /// the new deployment proceeds.
    async fn stop_superseded(&self, agent_id: Uuid) {
        for deployment in self.store.running_for(agent_id) {
            if let Err(err) = self.stop(deployment.id).await {
                warn!(
                    deployment_id = %deployment.id,
                    agent_id = %agent_id,
                    error = %err,
                    "Failed to stop superseded deployment"
                );
            }
        }
    }

    fn mark_failed(&self, id: Uuid, err: &OrchestratorError) {
        let message = truncate_error(&err.to_string());
        if let Err(store_err) = self
            .store
            .transition(id, DeploymentStatus::Failed, |d| d.error = Some(message))
        {
            error!(
                deployment_id = %id,
                error = %store_err,
                "Could not mark deployment as failed"
            );
        }
    }
}

fn truncate_error(message: &str) -> String {
    if message.chars().count() <= ERROR_MESSAGE_LIMIT {
        return message.to_string();
    }
    message.chars().take(ERROR_MESSAGE_LIMIT).collect()
}
