//! Store error types.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the internal event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists at the given identifier.
    ///
    /// This is a signal, not only a failure: the reconciliation engine's
    /// collision probe treats it as "identifier is free".
    #[error("no record with id: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A record already exists at the given identifier.
    #[error("record already exists with id: {id}")]
    Conflict {
        /// The identifier that collided.
        id: String,
    },

    /// IO error from a file-backed store.
    #[error("store IO error: {0}")]
    Io(#[from] io::Error),

    /// The persisted document could not be read or written as JSON.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a conflict error.
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict { id: id.into() }
    }

    /// Returns true if this is the not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
