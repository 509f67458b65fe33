//! Error types for the conversion engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the conversion engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Core configuration error (duplicate instance, unknown source).
    #[error(transparent)]
    Core(#[from] tidelink_core::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The engine is already started.
    #[error("engine already running")]
    AlreadyRunning,

    /// Other error.
    #[error("other: {0}")]
    Other(#[from] anyhow::Error),
}
