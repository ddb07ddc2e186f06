//! Common error types used throughout reelid.
//!
//! This module provides a unified error type that covers the failure classes
//! of the resolution pipeline: missing records, backend faults, storage
//! faults, invalid input, and cached records that violate integrity
//! expectations.

/// Common error type for reelid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A call to the retrieval backend failed or returned a malformed
    /// response.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A cache storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored record is missing fields the caller requires (e.g. a show
    /// record without a numeric backend id).
    #[error("Data integrity fault: {0}")]
    DataIntegrity(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a new Storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new DataIntegrity error.
    pub fn integrity<S: Into<String>>(msg: S) -> Self {
        Self::DataIntegrity(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
