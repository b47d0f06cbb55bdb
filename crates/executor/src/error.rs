//! Error types for command execution.
//!
//! [`Error`] mirrors the engine's error taxonomy in a serializable form so
//! that it can cross a transport boundary unchanged.

use serde::{Deserialize, Serialize};

/// Command execution errors.
///
/// # Categories
///
/// | Category   | Variants                           | Description                |
/// |------------|------------------------------------|----------------------------|
/// | Not Found  | `NotFound`                         | Entity doesn't exist       |
/// | Validation | `InvalidQuery`, `InvalidInput`, `InvalidCommand` | Bad request  |
/// | Index      | `IndexSync`, `Rebuild`             | Index could not be updated |
/// | System     | `Config`, `Io`                     | Infrastructure errors      |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    /// Entity not found
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: u64 },

    /// Query cannot be executed as specified
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Entity field violates a constraint
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Command cannot be used in this position
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },

    /// Mutation aborted because the index could not be updated
    #[error("index synchronization failed for {entity}: {reason}")]
    IndexSync { entity: String, reason: String },

    /// Bulk reindex failed
    #[error("index rebuild failed: {reason}")]
    Rebuild { reason: String },

    /// Invalid configuration
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// I/O failure
    #[error("I/O error: {reason}")]
    Io { reason: String },
}
