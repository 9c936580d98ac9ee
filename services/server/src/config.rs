//! Configuration module
//!
//! Handles loading and validating server configuration from TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the Berth server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Container engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Configuration compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Component catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Deployment store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Model inference credential injected into every container.
    /// Falls back to the ANTHROPIC_API_KEY environment variable.
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API server listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

/// Container engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Docker socket path
    #[serde(default = "default_docker_socket")]
    pub docker_socket: String,

    /// Host used to reach published container ports
    #[serde(default = "default_container_host")]
    pub container_host: String,

    /// Seconds to wait for a graceful container stop before forcing
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

/// Configuration compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Model identifier baked into compiled manifests
    #[serde(default = "default_model")]
    pub model: String,
}

/// Component catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the JSON catalog mapping version ids to component lists
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

/// Deployment store settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Optional append-only JSONL journal of status transitions
    pub journal_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_listen_addr() -> String {
    "127.0.0.1:7070".to_string()
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_container_host() -> String {
    "127.0.0.1".to_string()
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("config/catalog.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            docker_socket: default_docker_socket(),
            container_host: default_container_host(),
            stop_timeout_secs: default_stop_timeout(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Resolve the model inference credential from config or environment
    pub fn model_api_key(&self) -> Option<String> {
        self.anthropic_api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:7070");
        assert_eq!(config.engine.docker_socket, "/var/run/docker.sock");
        assert_eq!(config.engine.stop_timeout_secs, 10);
        assert!(config.store.journal_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_content = r#"
            [server]
            listen_addr = "0.0.0.0:9000"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.engine.container_host, "127.0.0.1");
        assert_eq!(config.compiler.model, "claude-sonnet-4-5-20250929");
    }
}
