use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;

use super::Deployment;

/// List deployments for an agent
pub async fn run(agent_id: &str, status: Option<String>, limit: usize) -> Result<()> {
    let api = ApiClient::from_config()?;

    let mut path = format!("/agents/{}/deployments?limit={}", agent_id, limit);
    if let Some(status) = &status {
        path.push_str(&format!("&status={}", status));
    }

    let deployments: Vec<Deployment> = api.get(&path).await?;

    if deployments.is_empty() {
        println!("{}", "No deployments found.".dimmed());
        return Ok(());
    }

    println!("{}", "Deployments".bold());
    println!("{}", "─".repeat(78));
    println!(
        "  {:<38} {:<10} {:>16} {:>10}",
        "ID".dimmed(),
        "STATUS".dimmed(),
        "ENDPOINT".dimmed(),
        "CREATED".dimmed(),
    );
    println!("{}", "─".repeat(78));

    for deployment in &deployments {
        let endpoint = deployment
            .endpoint
            .as_ref()
            .map(|e| format!("{}:{}", e.host, e.port))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<38} {:<10} {:>16} {:>10}",
            deployment.id,
            super::colorize_status(&deployment.status),
            endpoint,
            deployment.created_at.format("%m-%d %H:%M"),
        );
    }

    println!();
    println!("{} deployment(s)", deployments.len());

    Ok(())
}
