use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;

#[derive(Debug, Deserialize)]
pub struct WorkingMemory {
    #[serde(default)]
    pub user_injected: Vec<InjectedEntry>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct InjectedEntry {
    pub id: String,
    pub content: String,
    pub source: String,
}

#[derive(Debug, Serialize)]
struct InjectRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Show a deployment's working memory
pub async fn list(deployment_id: &str) -> Result<()> {
    let api = ApiClient::from_config()?;
    let memory: WorkingMemory = api
        .get(&format!("/deployments/{}/working-memory", deployment_id))
        .await?;

    print_entries(&memory);
    Ok(())
}

/// Inject content into a deployment's working memory
pub async fn add(deployment_id: &str, content: &str, name: Option<String>) -> Result<()> {
    let api = ApiClient::from_config()?;
    let memory: WorkingMemory = api
        .post(
            &format!("/deployments/{}/working-memory", deployment_id),
            &InjectRequest { content, name },
        )
        .await?;

    println!("{} Injected into working memory", "✓".green().bold());
    print_entries(&memory);
    Ok(())
}

/// Clear a deployment's working memory
pub async fn clear(deployment_id: &str) -> Result<()> {
    let api = ApiClient::from_config()?;
    let _: WorkingMemory = api
        .delete(&format!("/deployments/{}/working-memory", deployment_id))
        .await?;

    println!("{} Working memory cleared", "✓".green().bold());
    Ok(())
}

fn print_entries(memory: &WorkingMemory) {
    if memory.user_injected.is_empty() {
        println!("{}", "Working memory is empty.".dimmed());
        return;
    }

    println!("{}", "Working Memory".bold());
    for entry in &memory.user_injected {
        println!("  {} {}", entry.id.dimmed(), entry.content);
    }
    println!();
    println!("{} entry(ies)", memory.user_injected.len());
}
