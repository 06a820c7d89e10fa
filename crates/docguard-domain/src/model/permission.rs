//! Permission identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A permission identifier (e.g., "documents.document_view").
///
/// Ordering is lexicographic on (namespace, name) so permission sets
/// render deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    /// The namespace portion (e.g., "documents").
    pub namespace: String,
    /// The name portion (e.g., "document_view").
    pub name: String,
}

impl PermissionKey {
    /// Creates a new PermissionKey from namespace and name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses a permission from "namespace.name" format.
    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::InvalidPermissionFormat {
            value: value.to_string(),
        };
        let (namespace, name) = value.split_once('.').ok_or_else(invalid)?;
        if namespace.is_empty() || name.is_empty() || name.contains('.') {
            return Err(invalid());
        }
        Ok(Self::new(namespace, name))
    }

    /// Returns true if this permission belongs to the given namespace.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A registered permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub key: PermissionKey,
    /// Human-readable label (e.g., "View documents").
    pub label: String,
    /// Human-readable label of the owning namespace (e.g., "Documents").
    pub namespace_label: String,
}

impl Permission {
    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.key)
    }
}
