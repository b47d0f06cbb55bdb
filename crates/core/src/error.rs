//! Error types for Libris
//!
//! This module defines the error taxonomy used throughout the workspace.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Variant       | Raised when                                         | Propagation          |
//! |---------------|-----------------------------------------------------|----------------------|
//! | `NotFound`    | a referenced id does not resolve                    | mutations no-op      |
//! | `InvalidQuery`| malformed pattern, unknown field, zero page/limit   | returned to caller   |
//! | `InvalidInput`| entity field violates a limit                       | returned to caller   |
//! | `IndexSync`   | index update fails inside a unit of work            | whole unit rolls back|
//! | `Rebuild`     | bulk reindex fails                                  | fatal at startup     |

use crate::types::EntityKind;
use std::io;
use thiserror::Error;

/// Result type alias for Libris operations
pub type LibrisResult<T> = std::result::Result<T, LibrisError>;

/// Error types for the catalog
#[derive(Debug, Error)]
pub enum LibrisError {
    /// Referenced id does not resolve in the record store
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of the missing entity
        entity: EntityKind,
        /// Raw id that failed to resolve
        id: u64,
    },

    /// Query cannot be executed as specified
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        /// What is wrong with the query
        reason: String,
    },

    /// Entity field violates a constraint
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        /// Offending field name
        field: &'static str,
        /// Constraint that was violated
        reason: String,
    },

    /// Index update failed while committing a mutation
    #[error("Index synchronization failed for {entity}: {reason}")]
    IndexSync {
        /// Entity kind whose document could not be derived or applied
        entity: EntityKind,
        /// Failure detail
        reason: String,
    },

    /// Bulk reindex failed
    #[error("Index rebuild failed: {reason}")]
    Rebuild {
        /// Failure detail
        reason: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {reason}")]
    Config {
        /// Failure detail
        reason: String,
    },

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LibrisError {
    /// Build a `NotFound` error
    pub fn not_found(entity: EntityKind, id: u64) -> Self {
        LibrisError::NotFound { entity, id }
    }

    /// Build an `InvalidQuery` error
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        LibrisError::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Build an `InvalidInput` error
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        LibrisError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Build an `IndexSync` error
    pub fn index_sync(entity: EntityKind, reason: impl Into<String>) -> Self {
        LibrisError::IndexSync {
            entity,
            reason: reason.into(),
        }
    }

    /// Build a `Rebuild` error
    pub fn rebuild(reason: impl Into<String>) -> Self {
        LibrisError::Rebuild {
            reason: reason.into(),
        }
    }

    /// Build a `Config` error
    pub fn config(reason: impl Into<String>) -> Self {
        LibrisError::Config {
            reason: reason.into(),
        }
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, LibrisError::NotFound { .. })
    }

    /// True for errors the caller caused (bad query or bad input)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LibrisError::InvalidQuery { .. } | LibrisError::InvalidInput { .. }
        )
    }

    /// True for errors that must stop the service from starting
    pub fn is_fatal(&self) -> bool {
        matches!(self, LibrisError::Rebuild { .. } | LibrisError::Config { .. })
    }
}
