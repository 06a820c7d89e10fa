//! Errors surfaced to callers of the access-control service.
//!
//! Expected denials become [`AccessError::Unauthorized`],
//! [`AccessError::PermissionDenied`] or [`AccessError::ObjectNotFound`].
//! Domain and storage failures pass through unchanged so they are never
//! mistaken for a denial.

use docguard_domain::{DenyReason, DomainError};
use docguard_storage::StorageError;
use thiserror::Error;

/// Error returned by `require_*` checks and administrative operations.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No usable identity for a non-public permission.
    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied")]
    PermissionDenied,

    /// The object, or an object it resolves through, does not exist.
    #[error("object not found")]
    ObjectNotFound,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<DenyReason> for AccessError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthorized => Self::Unauthorized,
            DenyReason::ObjectNotFound => Self::ObjectNotFound,
            DenyReason::PermissionDenied => Self::PermissionDenied,
        }
    }
}

impl AccessError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::PermissionDenied => 403,
            Self::ObjectNotFound => 404,
            Self::Domain(err) => match err {
                DomainError::InvalidPermissionFormat { .. }
                | DomainError::InvalidObjectFormat { .. }
                | DomainError::InvalidSubjectFormat { .. }
                | DomainError::InvalidAceTarget { .. } => 400,
                // Unknown or duplicate permissions are registry defects.
                DomainError::UnknownPermission { .. }
                | DomainError::DuplicatePermission { .. }
                | DomainError::DepthLimitExceeded { .. }
                | DomainError::StorageError { .. } => 500,
                DomainError::StorageUnavailable { .. } => 503,
            },
            Self::Storage(err) => match err {
                StorageError::RoleNotFound { .. } | StorageError::ObjectNotFound { .. } => 404,
                StorageError::RoleAlreadyExists { .. } => 409,
                StorageError::InvalidInput { .. } => 400,
                StorageError::ConnectionError { .. } => 503,
                StorageError::InternalError { .. } => 500,
            },
        }
    }

    /// Whether the error is an access decision rather than a failure.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::PermissionDenied | Self::ObjectNotFound
        )
    }
}

/// Result type for service operations.
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_map_to_client_statuses() {
        assert_eq!(AccessError::from(DenyReason::Unauthorized).status_code(), 401);
        assert_eq!(AccessError::from(DenyReason::PermissionDenied).status_code(), 403);
        assert_eq!(AccessError::from(DenyReason::ObjectNotFound).status_code(), 404);
        assert!(AccessError::PermissionDenied.is_denial());
    }

    #[test]
    fn test_defects_are_server_errors() {
        let err = AccessError::from(DomainError::UnknownPermission {
            namespace: "documents".to_string(),
            name: "document_shred".to_string(),
        });
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_denial());
        assert_eq!(err.to_string(), "unknown permission: documents.document_shred");

        let err = AccessError::from(StorageError::ConnectionError {
            message: "down".to_string(),
        });
        assert_eq!(err.status_code(), 503);

        let err = AccessError::from(DomainError::DepthLimitExceeded { max_depth: 25 });
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_denial());
    }

    #[test]
    fn test_unavailable_store_through_a_check_is_503() {
        let err = AccessError::from(crate::adapters::storage_error(
            StorageError::ConnectionError {
                message: "down".to_string(),
            },
        ));
        assert_eq!(err.status_code(), 503);
        assert!(!err.is_denial());
    }

    #[test]
    fn test_admin_input_errors() {
        let err = AccessError::from(DomainError::InvalidAceTarget {
            kind: "index_instance_node".to_string(),
        });
        assert_eq!(err.status_code(), 400);

        let err = AccessError::from(StorageError::RoleAlreadyExists {
            role: "editors".to_string(),
        });
        assert_eq!(err.status_code(), 409);
        let err = AccessError::from(StorageError::RoleNotFound {
            role: "ghost".to_string(),
        });
        assert_eq!(err.status_code(), 404);
    }
}
