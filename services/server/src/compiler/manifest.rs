//! Runtime Manifest
//!
//! The compiled agent configuration consumed by the container build. A
//! manifest is an ephemeral value object: it is serialized into the image
//! build context and never persisted as its own entity.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Compiled runtime configuration for one agent version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Combined instructions document derived from skills and memory
    pub instructions: String,
    /// Tool definitions in the inference API's wire shape
    pub tools: Vec<serde_json::Value>,
    /// Memory items carried alongside the instructions, untruncated
    pub memory: Vec<MemoryEntry>,
    /// Names of the skills that contributed to the instructions
    pub skills: Vec<String>,
    /// Model identifier the runtime should use
    pub model: String,
}

/// A single memory item in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Manifest {
    /// Serialize the manifest as the build-context JSON document.
    ///
    /// Struct field order is fixed and serde_json orders map keys, so
    /// identical manifests always serialize byte-identically.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 hex digest of the canonical serialization
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest {
            instructions: "You are an AI agent with specialized capabilities.".to_string(),
            tools: vec![serde_json::json!({"name": "lookup"})],
            memory: vec![MemoryEntry {
                key: "notes".to_string(),
                content: "remember this".to_string(),
                description: None,
            }],
            skills: vec!["greet".to_string()],
            model: "claude-sonnet-4-5-20250929".to_string(),
        }
    }

    #[test]
    fn test_serialization_is_stable() {
        let a = sample().to_json().unwrap();
        let b = sample().to_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_tracks_content() {
        let base = sample();
        let mut changed = sample();
        changed.instructions.push_str(" Be brief.");

        assert_eq!(base.digest(), sample().digest());
        assert_ne!(base.digest(), changed.digest());
    }
}
