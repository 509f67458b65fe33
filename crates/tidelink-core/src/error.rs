//! Error types for the core conversion components.

use thiserror::Error;

use crate::mapping::DeviceKind;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core conversion components.
#[derive(Debug, Error)]
pub enum Error {
    /// Two mappings of the same device kind claim the same protocol
    /// instance. Fatal at configuration time.
    #[error(
        "duplicate {kind} instance {instance}: sources `{first}` and `{second}`"
    )]
    DuplicateInstance {
        kind: DeviceKind,
        instance: u8,
        first: String,
        second: String,
    },

    /// A source id referenced by the caller is not in the mapping table.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
