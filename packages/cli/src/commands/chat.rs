use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
}

/// Send a chat message to a running deployment
pub async fn run(deployment_id: &str, message: &str, conversation: Option<String>) -> Result<()> {
    let api = ApiClient::from_config()?;

    let reply: ChatReply = api
        .post(
            &format!("/deployments/{}/chat", deployment_id),
            &ChatRequest {
                message,
                conversation_id: conversation,
            },
        )
        .await?;

    println!("{}", reply.response);
    println!();
    println!(
        "  Continue: {} chat {} \"...\" --conversation {}",
        "berth".dimmed(),
        deployment_id,
        reply.conversation_id.dimmed()
    );

    Ok(())
}
