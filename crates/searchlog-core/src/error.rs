//! Error types for SearchLog Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    // Backend errors
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than a backend
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// True for errors raised by the client query cache
    pub fn is_cache(&self) -> bool {
        matches!(self, Error::Cache(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
