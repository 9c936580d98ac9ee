use anyhow::Result;
use clap::{Parser, Subcommand};

mod api;
mod commands;
mod config;

#[derive(Parser)]
#[command(name = "berth", about = "Berth CLI - Manage your agent deployments")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Point the CLI at a Berth server
    Connect {
        /// API base URL (default: http://127.0.0.1:7070)
        api_url: String,
    },

    /// Deploy a configuration version for an agent
    Deploy {
        /// Agent ID
        agent_id: String,

        /// Configuration version ID to deploy
        #[arg(short, long)]
        version: String,
    },

    /// List deployments for an agent
    List {
        /// Agent ID
        agent_id: String,

        /// Filter by status (pending, building, starting, running, stopping, stopped, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of deployments to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show deployment status including container health
    Status {
        /// Deployment ID
        deployment_id: String,
    },

    /// Stop a running deployment
    Stop {
        /// Deployment ID
        deployment_id: String,
    },

    /// Stop every running deployment
    StopAll,

    /// Send a chat message to a running deployment
    Chat {
        /// Deployment ID
        deployment_id: String,

        /// Message to send
        message: String,

        /// Conversation ID to continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Inspect or edit a deployment's working memory
    Memory {
        /// Deployment ID
        deployment_id: String,

        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Show current working-memory entries
    List,

    /// Inject content into working memory
    Add {
        /// Content to inject
        content: String,

        /// Entry name; an existing entry with the same name is replaced
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Clear all working-memory entries
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Connect { api_url } => commands::connect::run(api_url),
        Commands::Deploy { agent_id, version } => {
            commands::deploy::run(&agent_id, &version).await
        }
        Commands::List {
            agent_id,
            status,
            limit,
        } => commands::list::run(&agent_id, status, limit).await,
        Commands::Status { deployment_id } => commands::status::run(&deployment_id).await,
        Commands::Stop { deployment_id } => commands::stop::run(&deployment_id).await,
        Commands::StopAll => commands::stop::run_all().await,
        Commands::Chat {
            deployment_id,
            message,
            conversation,
        } => commands::chat::run(&deployment_id, &message, conversation).await,
        Commands::Memory {
            deployment_id,
            action,
        } => match action {
            MemoryAction::List => commands::memory::list(&deployment_id).await,
            MemoryAction::Add { content, name } => {
                commands::memory::add(&deployment_id, &content, name).await
            }
            MemoryAction::Clear => commands::memory::clear(&deployment_id).await,
        },
    }
}
