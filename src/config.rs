//! Service configuration.
//!
//! Loaded from a TOML file; every section and field has a default, so an
//! empty file (or no file at all) yields a working setup. Command-line flags
//! override what is read here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Read from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kvsearch.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Picks the configuration for a run.
    ///
    /// An explicit path must load cleanly. Otherwise `fallback` is used when
    /// present (bad contents fall back to defaults with a warning), and plain
    /// defaults when it is absent.
    pub fn resolve(explicit: Option<&Path>, fallback: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if fallback.exists() => Ok(Self::load_or_default(fallback)),
            None => Ok(Self::default()),
        }
    }

    /// Bind address as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(Error::Config("embedding.dimension must be at least 1".to_string()));
        }
        if self.server.host.is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Feature-hashing bag-of-words, no model files needed.
    Hashing,
    /// candle BERT sentence-transformer (feature `bert`).
    Bert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Vector length for the hashing backend. BERT models report their own.
    pub dimension: usize,
    /// Hugging Face model id for the BERT backend.
    pub model_id: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hashing,
            dimension: 384,
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
        }
    }
}

/// Documents loaded before the server starts accepting traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Load the built-in sample documents.
    pub builtin: bool,
    /// JSON file holding an array of `{"id": ..., "text": ...}`.
    pub path: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            path: None,
        }
    }
}
