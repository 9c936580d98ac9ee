//! Berth Server Library
//!
//! This crate provides the core functionality for the Berth deployment
//! server: compiling agent configurations into runtime manifests, driving
//! the container engine through the deployment lifecycle, and proxying
//! chat and streaming traffic into running agent containers.

pub mod api;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod gateway;
pub mod orchestrator;
pub mod runtime;

// Re-exports for convenience
pub use catalog::{Component, ComponentKind, ComponentSource, JsonCatalog};
pub use compiler::manifest::{Manifest, MemoryEntry};
pub use config::Config;
pub use gateway::Gateway;
pub use orchestrator::service::Orchestrator;
pub use orchestrator::state::DeploymentStatus;
pub use orchestrator::store::{Deployment, DeploymentStore, Endpoint};
pub use runtime::adapter::{ContainerHealth, EngineAdapter, EngineError};
pub use runtime::docker::adapter::DockerEngine;
