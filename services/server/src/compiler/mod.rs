//! Config Compiler
//!
//! Turns configuration components into a deterministic runtime manifest.

pub mod compile;
pub mod manifest;

pub use compile::compile;
pub use manifest::{Manifest, MemoryEntry};
