//! Error types for veil-core.

use thiserror::Error;

/// Result type for veil-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in veil-core operations.
///
/// None of these are fatal to a page: the worst outcome of any of them is
/// that gated content stays locked.
#[derive(Debug, Error)]
pub enum Error {
    /// Backing storage cannot be written (not yet interactive, quota, privacy mode)
    #[error("unlock storage is unavailable")]
    StorageUnavailable,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
