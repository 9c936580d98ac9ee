//! Component Catalog
//!
//! The seam to the upstream authoring pipeline. Upstream systems produce
//! configuration components (skills, tool specs, memory items) keyed by a
//! configuration version; this module only consumes them and assumes they
//! are well formed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Kind of a configuration component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Skill,
    Tool,
    Memory,
}

/// A single configuration component as produced upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Structured configuration, meaningful for tool components
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown configuration version: {0}")]
    UnknownVersion(Uuid),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of configuration components, keyed by configuration version
#[async_trait]
pub trait ComponentSource: Send + Sync {
    async fn components(&self, version_id: Uuid) -> Result<Vec<Component>, CatalogError>;
}

/// File-backed component source loaded once at startup.
///
/// The file is a JSON object mapping version ids to component arrays.
pub struct JsonCatalog {
    versions: HashMap<Uuid, Vec<Component>>,
}

impl JsonCatalog {
    /// Load a catalog from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let versions: HashMap<Uuid, Vec<Component>> = serde_json::from_str(&content)?;
        Ok(Self { versions })
    }

    /// Create an empty catalog
    pub fn empty() -> Self {
        Self {
            versions: HashMap::new(),
        }
    }

    /// Create a catalog from an in-memory map
    pub fn from_map(versions: HashMap<Uuid, Vec<Component>>) -> Self {
        Self { versions }
    }

    /// Number of known configuration versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the catalog has no versions
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[async_trait]
impl ComponentSource for JsonCatalog {
    async fn components(&self, version_id: Uuid) -> Result<Vec<Component>, CatalogError> {
        self.versions
            .get(&version_id)
            .cloned()
            .ok_or(CatalogError::UnknownVersion(version_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_version() {
        let catalog = JsonCatalog::empty();
        let version = Uuid::new_v4();

        let err = catalog.components(version).await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownVersion(v) if v == version));
    }

    #[tokio::test]
    async fn test_from_map_lookup() {
        let version = Uuid::new_v4();
        let mut versions = HashMap::new();
        versions.insert(
            version,
            vec![Component {
                kind: ComponentKind::Skill,
                name: "greet".to_string(),
                description: None,
                content: Some("Say hello.".to_string()),
                config: None,
            }],
        );

        let catalog = JsonCatalog::from_map(versions);
        let components = catalog.components(version).await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "greet");
    }

    #[test]
    fn test_parse_component_kinds() {
        let json = r#"
            [
                {"kind": "skill", "name": "a"},
                {"kind": "tool", "name": "b", "config": {"input_schema": {"type": "object"}}},
                {"kind": "memory", "name": "c", "content": "notes"}
            ]
        "#;

        let components: Vec<Component> = serde_json::from_str(json).unwrap();
        assert_eq!(components[0].kind, ComponentKind::Skill);
        assert_eq!(components[1].kind, ComponentKind::Tool);
        assert_eq!(components[2].kind, ComponentKind::Memory);
    }
}
