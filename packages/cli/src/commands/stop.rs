use anyhow::Result;
use colored::Colorize;
use serde::Deserialize;

use crate::api::ApiClient;

use super::Deployment;

#[derive(Debug, Deserialize)]
pub struct StopAllReport {
    pub stopped: usize,
    pub failed: usize,
    #[serde(default)]
    pub failures: Vec<StopFailure>,
}

#[derive(Debug, Deserialize)]
pub struct StopFailure {
    pub deployment_id: String,
    pub agent_id: String,
    pub error: String,
}

/// Stop a running deployment
pub async fn run(deployment_id: &str) -> Result<()> {
    let api = ApiClient::from_config()?;

    let deployment: Deployment = api
        .post_empty(&format!("/deployments/{}/stop", deployment_id))
        .await?;

    println!(
        "{} Deployment {} is {}",
        "✓".green().bold(),
        deployment.id,
        super::colorize_status(&deployment.status)
    );
    Ok(())
}

/// Stop every running deployment
pub async fn run_all() -> Result<()> {
    let api = ApiClient::from_config()?;

    let report: StopAllReport = api.post_empty("/deployments/stop-all").await?;

    println!(
        "{} Stopped {} deployment(s), {} failed",
        if report.failed == 0 {
            "✓".green().bold()
        } else {
            "!".yellow().bold()
        },
        report.stopped,
        report.failed,
    );

    for failure in &report.failures {
        println!(
            "  {} {} (agent {}): {}",
            "✗".red(),
            failure.deployment_id,
            failure.agent_id.dimmed(),
            failure.error,
        );
    }

    Ok(())
}
