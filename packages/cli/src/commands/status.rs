use anyhow::Result;
use colored::Colorize;
use serde::Deserialize;

use crate::api::ApiClient;

use super::Endpoint;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct DeploymentStatus {
    pub id: String,
    pub agent_id: String,
    pub version_id: String,
    pub status: String,
    pub endpoint: Option<Endpoint>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stopped_at: Option<chrono::DateTime<chrono::Utc>>,
    pub container: Option<ContainerHealth>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerHealth {
    pub status: String,
    pub running: bool,
    pub health: String,
}

/// Show deployment status including container health
pub async fn run(deployment_id: &str) -> Result<()> {
    let api = ApiClient::from_config()?;
    let view: DeploymentStatus = api.get(&format!("/deployments/{}", deployment_id)).await?;

    println!("{}", "Deployment".bold());
    println!("  ID:       {}", view.id);
    println!("  Agent:    {}", view.agent_id.dimmed());
    println!("  Version:  {}", view.version_id.dimmed());
    println!("  Status:   {}", super::colorize_status(&view.status));

    if let Some(endpoint) = &view.endpoint {
        println!("  Endpoint: {}", format!("{}:{}", endpoint.host, endpoint.port).cyan());
    }
    if let Some(error) = &view.error {
        println!("  Error:    {}", error.red());
    }

    println!("  Created:  {}", view.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(started) = view.started_at {
        println!("  Started:  {}", started.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(stopped) = view.stopped_at {
        println!("  Stopped:  {}", stopped.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(container) = &view.container {
        println!();
        println!("{}", "Container".bold());
        println!("  Status:   {}", super::colorize_status(&container.status));
        println!("  Running:  {}", container.running);
        println!(
            "  Health:   {}",
            match container.health.as_str() {
                "healthy" => container.health.green(),
                "unhealthy" => container.health.red(),
                _ => container.health.dimmed(),
            }
        );
    }

    Ok(())
}
