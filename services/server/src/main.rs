//! Berth Server Entry Point
//!
//! This is the main entry point for the berthd binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use berth_server::api::{self, AppState};
use berth_server::catalog::JsonCatalog;
use berth_server::config::Config;
use berth_server::gateway::Gateway;
use berth_server::orchestrator::service::Orchestrator;
use berth_server::orchestrator::store::DeploymentStore;
use berth_server::runtime::adapter::EngineAdapter;
use berth_server::runtime::docker::adapter::DockerEngine;

#[derive(Parser)]
#[command(name = "berthd")]
#[command(author, version, about = "Berth server - deploys agent configurations as containers")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/berthd.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        config
            .logging
            .level
            .parse()
            .unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Version => {
            show_version();
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Berth server...");

    if config.model_api_key().is_none() {
        // The credential is injected into containers, not validated here;
        // a missing key surfaces as a runtime failure inside the agent
        warn!("No model API key configured; deployed agents will fail at inference time");
    }

    // Initialize the Docker engine once for the process lifetime
    let engine = DockerEngine::with_socket(
        &config.engine.docker_socket,
        config.model_api_key(),
        config.engine.stop_timeout_secs,
    )
    .context("Failed to initialize Docker engine")?;

    let version = engine
        .version()
        .await
        .context("Failed to reach Docker engine")?;
    info!(engine_version = %version, "Container engine initialized");

    let engine: Arc<dyn EngineAdapter> = Arc::new(engine);

    // Component catalog
    let catalog = if config.catalog.path.exists() {
        let catalog = JsonCatalog::load(&config.catalog.path)
            .with_context(|| format!("Failed to load catalog: {}", config.catalog.path.display()))?;
        info!(
            path = %config.catalog.path.display(),
            versions = catalog.len(),
            "Component catalog loaded"
        );
        catalog
    } else {
        warn!(
            path = %config.catalog.path.display(),
            "Catalog file not found, starting with an empty catalog"
        );
        JsonCatalog::empty()
    };

    // Deployment store, with a transition journal when configured
    let store = match &config.store.journal_path {
        Some(path) => Arc::new(
            DeploymentStore::with_journal(path)
                .with_context(|| format!("Failed to open journal: {}", path.display()))?,
        ),
        None => Arc::new(DeploymentStore::in_memory()),
    };

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        engine,
        Arc::new(catalog),
        config.engine.container_host.clone(),
        config.compiler.model.clone(),
    ));
    let gateway = Arc::new(Gateway::new(store));

    let app = api::router(AppState {
        orchestrator,
        gateway,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "API server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn show_version() {
    println!("berthd {}", env!("CARGO_PKG_VERSION"));
    println!("Berth deployment server");
    println!();
    println!("Features:");
    println!("  - Deterministic agent configuration compilation");
    println!("  - Docker-backed deployment lifecycle");
    println!("  - Chat, streaming, and working-memory proxying");
}
