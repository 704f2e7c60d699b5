//! Error types for the reconciliation core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core reconciliation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Transaction type with no routing rule
    #[error("Unroutable transaction type: {0}")]
    Unroutable(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (config loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
