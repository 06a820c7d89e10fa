//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Role not found.
    #[error("role not found: {role}")]
    RoleNotFound { role: String },

    /// Role already exists.
    #[error("role already exists: {role}")]
    RoleAlreadyExists { role: String },

    /// Object not registered in the object graph.
    #[error("object not found: {object}")]
    ObjectNotFound { object: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Backend connection error.
    #[error("storage connection error: {message}")]
    ConnectionError { message: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
