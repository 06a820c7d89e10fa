//! Domain error types for authorization operations.
//!
//! Expected access-control outcomes (unauthorized, not found, denied) are
//! not errors; they are reported through [`crate::engine::Decision`]. The
//! variants here are configuration defects or backend failures and must be
//! propagated by callers.

use thiserror::Error;

/// Domain-specific errors for authorization operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A permission with the same namespace and name is already registered
    /// with different metadata.
    #[error("duplicate permission: {namespace}.{name}")]
    DuplicatePermission { namespace: String, name: String },

    /// A caller referenced a permission that was never registered.
    #[error("unknown permission: {namespace}.{name}")]
    UnknownPermission { namespace: String, name: String },

    /// Invalid permission identifier format.
    #[error("invalid permission format: {value}")]
    InvalidPermissionFormat { value: String },

    /// Invalid object reference format.
    #[error("invalid object format: {value}")]
    InvalidObjectFormat { value: String },

    /// Invalid subject format.
    #[error("invalid subject format: {value}")]
    InvalidSubjectFormat { value: String },

    /// The object kind cannot carry access control entries.
    #[error("objects of kind '{kind}' cannot be access control targets")]
    InvalidAceTarget { kind: String },

    /// Group nesting is deeper than the configured membership depth.
    #[error("group nesting exceeds depth limit of {max_depth}")]
    DepthLimitExceeded { max_depth: u32 },

    /// The backing policy store cannot be reached.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },

    /// Failure reported by the backing policy store.
    #[error("storage error: {message}")]
    StorageError { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
