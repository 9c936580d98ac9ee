//! Docker Adapter
//!
//! Implementation of EngineAdapter for Docker using the bollard library.
//! Constructed once per process; the socket connection is acquired at
//! startup and shared for the life of the server.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::image::BuildImageOptions;
use bollard::service::{
    ContainerInspectResponse, HealthStatusEnum, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::compiler::manifest::Manifest;
use crate::runtime::adapter::{ContainerHealth, EngineAdapter, EngineError};
use crate::runtime::docker::bootstrap;

impl From<bollard::errors::Error> for EngineError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => EngineError::NotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => EngineError::OperationFailed(format!(
                "engine rejected request ({}): {}",
                status_code, message
            )),
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}

/// Docker engine adapter
pub struct DockerEngine {
    client: Docker,
    api_key: Option<String>,
    stop_timeout_secs: i64,
}

impl DockerEngine {
    /// Connect to the default Docker socket
    pub fn new(api_key: Option<String>, stop_timeout_secs: u64) -> Result<Self, EngineError> {
        let client = Docker::connect_with_socket_defaults()?;
        Ok(Self {
            client,
            api_key,
            stop_timeout_secs: stop_timeout_secs as i64,
        })
    }

    /// Connect to a custom Docker socket path
    pub fn with_socket(
        socket_path: &str,
        api_key: Option<String>,
        stop_timeout_secs: u64,
    ) -> Result<Self, EngineError> {
        let client =
            Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)?;
        Ok(Self {
            client,
            api_key,
            stop_timeout_secs: stop_timeout_secs as i64,
        })
    }

    /// Engine version string, for startup logging
    pub async fn version(&self) -> Result<String, EngineError> {
        let version = self.client.version().await?;
        Ok(format!(
            "Docker {} (API {})",
            version.version.unwrap_or_default(),
            version.api_version.unwrap_or_default()
        ))
    }

    /// Deterministic image tag from agent and version id prefixes.
    /// Repeatable identification, not content addressing.
    fn image_tag(agent_id: Uuid, version_id: Uuid) -> String {
        format!(
            "agent-runtime-{}:{}",
            &agent_id.to_string()[..8],
            &version_id.to_string()[..8]
        )
    }

    fn parse_health(state: Option<&bollard::service::ContainerState>) -> ContainerHealth {
        use bollard::service::ContainerStateStatusEnum as S;

        let status = state
            .and_then(|s| s.status.as_ref())
            .map(|s| match s {
                S::CREATED => "created",
                S::RUNNING => "running",
                S::PAUSED => "paused",
                S::RESTARTING => "restarting",
                S::REMOVING => "removing",
                S::EXITED => "exited",
                S::DEAD => "dead",
                _ => "unknown",
            })
            .unwrap_or("unknown");

        let health = state
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status.as_ref())
            .map(|h| match h {
                HealthStatusEnum::STARTING => "starting",
                HealthStatusEnum::HEALTHY => "healthy",
                HealthStatusEnum::UNHEALTHY => "unhealthy",
                _ => "unknown",
            })
            .unwrap_or("unknown");

        ContainerHealth {
            status: status.to_string(),
            running: state.and_then(|s| s.running).unwrap_or(false),
            health: health.to_string(),
            started_at: state.and_then(|s| s.started_at.clone()),
            finished_at: state.and_then(|s| s.finished_at.clone()),
        }
    }

    fn assigned_host_port(
        inspect: &ContainerInspectResponse,
        port_key: &str,
    ) -> Option<u16> {
        inspect
            .network_settings
            .as_ref()?
            .ports
            .as_ref()?
            .get(port_key)?
            .as_ref()?
            .iter()
            .find_map(|binding| binding.host_port.as_deref().and_then(|p| p.parse().ok()))
    }
}

#[async_trait]
impl EngineAdapter for DockerEngine {
    fn engine_type(&self) -> &str {
        "docker"
    }

    async fn ping(&self) -> Result<(), EngineError> {
        self.client.ping().await?;
        Ok(())
    }

    async fn build_image(
        &self,
        agent_id: Uuid,
        version_id: Uuid,
        manifest: &Manifest,
    ) -> Result<String, EngineError> {
        let tag = Self::image_tag(agent_id, version_id);
        let manifest_json = manifest.to_json().map_err(|e| {
            EngineError::OperationFailed(format!("failed to serialize manifest: {}", e))
        })?;
        let context = bootstrap::build_context(&manifest_json).map_err(|e| {
            EngineError::OperationFailed(format!("failed to assemble build context: {}", e))
        })?;

        let mut labels = HashMap::new();
        labels.insert("berth.managed".to_string(), "true".to_string());
        labels.insert("berth.manifest_digest".to_string(), manifest.digest());

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: tag.clone(),
            rm: true,
            forcerm: true,
            labels,
            ..Default::default()
        };

        let mut stream = self.client.build_image(options, None, Some(context.into()));
        while let Some(update) = stream.next().await {
            let update = update?;
            if let Some(message) = update.error {
                return Err(EngineError::OperationFailed(format!(
                    "image build failed: {}",
                    message
                )));
            }
            if let Some(progress) = update.stream {
                let progress = progress.trim();
                if !progress.is_empty() {
                    debug!(image = %tag, "{}", progress);
                }
            }
        }

        info!(image = %tag, "Image built");
        Ok(tag)
    }

    async fn create_container(
        &self,
        image_ref: &str,
        name: &str,
    ) -> Result<(String, u16), EngineError> {
        // A stale container from an earlier attempt may hold the name
        match self
            .client
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => debug!(name = %name, "Removed stale container"),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(e.into()),
        }

        let port_key = format!("{}/tcp", bootstrap::RUNTIME_PORT);

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key.clone(), HashMap::new());

        // host_port None lets the engine pick an ephemeral port
        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: None,
            }]),
        );

        let mut env = Vec::new();
        if let Some(key) = &self.api_key {
            env.push(format!("ANTHROPIC_API_KEY={}", key));
        }

        let mut labels = HashMap::new();
        labels.insert("berth.managed".to_string(), "true".to_string());

        let host_config = bollard::service::HostConfig {
            port_bindings: Some(port_bindings),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let config = Config {
            image: Some(image_ref.to_string()),
            env: Some(env),
            labels: Some(labels),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name,
            platform: None,
        };

        let created = self
            .client
            .create_container(Some(create_options), config)
            .await?;
        self.client
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;

        // The engine assigns the host port at start; read the live mapping back
        let inspect = self.client.inspect_container(&created.id, None).await?;
        let port = Self::assigned_host_port(&inspect, &port_key).ok_or_else(|| {
            EngineError::OperationFailed(format!("no host port bound for container {}", name))
        })?;

        info!(container_id = %created.id, name = %name, port, "Container started");
        Ok((created.id, port))
    }

    async fn stop_container(&self, container_ref: &str) -> Result<(), EngineError> {
        let options = StopContainerOptions {
            t: self.stop_timeout_secs,
        };
        match self.client.stop_container(container_ref, Some(options)).await {
            Ok(()) => {
                info!(container_id = %container_ref, "Container stopped");
                Ok(())
            }
            // 404: already gone, 304: already stopped
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404 | 304,
                ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, container_ref: &str) -> Result<(), EngineError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self
            .client
            .remove_container(container_ref, Some(options))
            .await
        {
            Ok(()) => {
                info!(container_id = %container_ref, "Container removed");
                Ok(())
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn status(&self, container_ref: &str) -> Result<ContainerHealth, EngineError> {
        let inspect = self.client.inspect_container(container_ref, None).await?;
        Ok(Self::parse_health(inspect.state.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag_is_deterministic() {
        let agent_id = Uuid::new_v4();
        let version_id = Uuid::new_v4();

        let a = DockerEngine::image_tag(agent_id, version_id);
        let b = DockerEngine::image_tag(agent_id, version_id);
        assert_eq!(a, b);
        assert!(a.starts_with("agent-runtime-"));
        assert!(a.contains(':'));
    }

    #[test]
    fn test_error_normalization() {
        let not_found = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "no such container".to_string(),
        };
        assert!(matches!(EngineError::from(not_found), EngineError::NotFound(_)));

        let rejected = bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message: "conflict".to_string(),
        };
        assert!(matches!(
            EngineError::from(rejected),
            EngineError::OperationFailed(_)
        ));
    }

    #[test]
    fn test_assigned_host_port_reads_first_binding() {
        let mut ports = HashMap::new();
        ports.insert(
            "8080/tcp".to_string(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some("49153".to_string()),
            }]),
        );
        let inspect = ContainerInspectResponse {
            network_settings: Some(bollard::service::NetworkSettings {
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            DockerEngine::assigned_host_port(&inspect, "8080/tcp"),
            Some(49153)
        );
        assert_eq!(DockerEngine::assigned_host_port(&inspect, "9090/tcp"), None);
    }
}
