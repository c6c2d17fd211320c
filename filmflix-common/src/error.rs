//! Common error types for Filmflix

use thiserror::Error;

/// Common result type for Filmflix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the catalog service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced id is malformed or points at a missing document
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Document store rejected an operation (e.g. `$push` onto a non-array)
    #[error("Store error: {0}")]
    Store(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reference validation failures, reported to the client as 400
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Id at `index` is not a well-formed identifier
    #[error("Id of {kind} no. {index} is invalid")]
    InvalidId { kind: &'static str, index: usize },

    /// At least one id is well-formed but has no document behind it
    #[error("At least one {kind} id does not exist")]
    Missing { kind: &'static str },
}
