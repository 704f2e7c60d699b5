//! Error types for link building

use thiserror::Error;

/// Result type for linkage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Linkage errors
#[derive(Error, Debug)]
pub enum Error {
    /// Link already carries a resolution; direct matches take precedence
    #[error("Link already resolved: {0}")]
    AlreadyResolved(String),
}
