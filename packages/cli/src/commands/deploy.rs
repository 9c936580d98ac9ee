use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::api::ApiClient;

use super::Deployment;

#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    version_id: &'a str,
}

/// Deploy a configuration version for an agent
pub async fn run(agent_id: &str, version_id: &str) -> Result<()> {
    let api = ApiClient::from_config()?;

    println!("{} Deploying agent {}...", "→".blue().bold(), agent_id);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")?,
    );
    spinner.set_message("Building image and starting container");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result: Result<Deployment> = api
        .post(
            &format!("/agents/{}/deploy", agent_id),
            &DeployRequest {
                version_id,
            },
        )
        .await;

    match result {
        Ok(deployment) => {
            let endpoint = deployment
                .endpoint
                .as_ref()
                .map(|e| format!("{}:{}", e.host, e.port))
                .unwrap_or_else(|| "-".to_string());
            spinner.finish_with_message(format!(
                "{} Deployment {} is {} at {}",
                "✓".green().bold(),
                deployment.id,
                super::colorize_status(&deployment.status),
                endpoint.cyan(),
            ));

            println!();
            println!(
                "  Chat with it: {} chat {} \"hello\"",
                "berth".dimmed(),
                deployment.id
            );
            Ok(())
        }
        Err(err) => {
            spinner.finish_with_message(format!("{} Deployment failed", "✗".red().bold()));
            Err(err)
        }
    }
}
