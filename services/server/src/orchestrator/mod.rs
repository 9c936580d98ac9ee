//! Deployment Orchestrator
//!
//! Owns the deployment state machine and sequences compiler and engine
//! calls. Every status transition goes through the store, which enforces
//! the central transition table.

pub mod service;
pub mod state;
pub mod store;

pub use service::{Orchestrator, OrchestratorError, StopAllReport};
pub use state::DeploymentStatus;
pub use store::{Deployment, DeploymentStore, Endpoint, StoreError};
