//! Error types for kvsearch.
//!
//! `IndexError` covers the only two ways the index itself can refuse a call.
//! `Error` is the crate-level type used by the embedding, service, config and
//! seed layers; it wraps `IndexError` so `?` works across the stack.

use thiserror::Error;

/// Errors raised by [`crate::VectorIndex`].
///
/// Both are input errors: retrying the same call reproduces them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid top_k: {0} (must be at least 1)")]
    InvalidTopK(usize),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Seed data error: {0}")]
    Seed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Seed(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
