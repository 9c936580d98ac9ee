pub mod chat;
pub mod connect;
pub mod deploy;
pub mod list;
pub mod memory;
pub mod status;
pub mod stop;

use serde::Deserialize;

/// Deployment record as returned by the server
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct Deployment {
    pub id: String,
    pub agent_id: String,
    pub version_id: String,
    pub status: String,
    pub image_ref: Option<String>,
    pub container_ref: Option<String>,
    pub endpoint: Option<Endpoint>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stopped_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// Paint a status string in its conventional color
pub fn colorize_status(status: &str) -> colored::ColoredString {
    use colored::Colorize;

    match status {
        "running" => status.green(),
        "failed" => status.red(),
        "stopped" => status.dimmed(),
        "pending" | "building" | "starting" | "stopping" => status.yellow(),
        _ => status.normal(),
    }
}
