//! Unified error types for Gardener

use thiserror::Error;

/// Unified error type for all Gardener operations
#[derive(Error, Debug)]
pub enum GardenerError {
    // Git errors
    #[error("git command failed: {0}")]
    GitCommand(String),

    #[error("repository error: {0}")]
    Repository(String),

    // Generation client errors
    #[error("hosted client error: {0}")]
    Hosted(String),

    #[error("local client error: {0}")]
    Local(String),

    // State errors
    #[error("state store error: {0}")]
    State(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using GardenerError
pub type Result<T> = std::result::Result<T, GardenerError>;
