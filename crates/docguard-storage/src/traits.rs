//! PolicyStore trait definition.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::tables::PolicyTables;

/// Maximum length of role names, member identifiers and object ids.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Key of an object in the object graph (e.g., "document:7").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub object_type: String,
    pub object_id: String,
}

impl ObjectKey {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

/// A stored object with its optional owner edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub owner: Option<ObjectKey>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A stored role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRole {
    pub name: String,
    /// Globally granted permissions, as "namespace.name".
    pub permissions: BTreeSet<String>,
    /// Direct members, as "user:<id>" or "group:<id>".
    pub members: BTreeSet<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A stored access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoredAce {
    /// Permission as "namespace.name".
    pub permission: String,
    pub object: ObjectKey,
    pub role: String,
}

impl StoredAce {
    pub fn new(permission: impl Into<String>, object: ObjectKey, role: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            object,
            role: role.into(),
        }
    }
}

/// Filter for reading access control entries.
#[derive(Debug, Clone, Default)]
pub struct AceFilter {
    /// Filter by permission.
    pub permission: Option<String>,
    /// Filter by target object.
    pub object: Option<ObjectKey>,
    /// Filter by role.
    pub role: Option<String>,
}

impl AceFilter {
    pub fn matches(&self, ace: &StoredAce) -> bool {
        self.permission.as_ref().map_or(true, |p| *p == ace.permission)
            && self.object.as_ref().map_or(true, |o| *o == ace.object)
            && self.role.as_ref().map_or(true, |r| *r == ace.role)
    }
}

/// Abstract storage interface for policy state.
///
/// Implementations must be thread-safe (Send + Sync). Mutations touching
/// the same role, group or (permission, object) pair must be serialized,
/// and [`PolicyStore::snapshot`] must return a state that reflects whole
/// mutations only.
#[async_trait]
pub trait PolicyStore: Send + Sync + 'static {
    // Role operations

    /// Creates a new, empty role.
    async fn create_role(&self, name: &str) -> StorageResult<StoredRole>;

    /// Gets a role by name.
    async fn get_role(&self, name: &str) -> StorageResult<StoredRole>;

    /// Deletes a role together with every ACE naming it.
    async fn delete_role(&self, name: &str) -> StorageResult<()>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> StorageResult<Vec<StoredRole>>;

    /// Grants a permission to a role globally. Idempotent.
    async fn grant_permission(&self, role: &str, permission: &str) -> StorageResult<()>;

    /// Revokes a global permission from a role. Idempotent.
    async fn revoke_permission(&self, role: &str, permission: &str) -> StorageResult<()>;

    /// Adds a user or group to a role. Idempotent.
    async fn add_role_member(&self, role: &str, member: &str) -> StorageResult<()>;

    /// Removes a user or group from a role. Idempotent.
    async fn remove_role_member(&self, role: &str, member: &str) -> StorageResult<()>;

    // Group operations

    /// Adds a user or group to a group. Groups are created on first use.
    async fn add_group_member(&self, group: &str, member: &str) -> StorageResult<()>;

    /// Removes a member from a group. Idempotent.
    async fn remove_group_member(&self, group: &str, member: &str) -> StorageResult<()>;

    /// Lists the direct members of a group.
    async fn list_group_members(&self, group: &str) -> StorageResult<Vec<String>>;

    // Object graph operations

    /// Registers an object, or replaces the owner of an existing one.
    async fn put_object(&self, key: ObjectKey, owner: Option<ObjectKey>)
        -> StorageResult<StoredObject>;

    /// Gets an object by key.
    async fn get_object(&self, key: &ObjectKey) -> StorageResult<StoredObject>;

    /// Deletes an object together with every ACE targeting it.
    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()>;

    // ACE operations

    /// Writes ACEs atomically: deletes are applied first, then writes.
    /// Writing an existing ACE or deleting a missing one is a no-op.
    async fn write_aces(&self, writes: Vec<StoredAce>, deletes: Vec<StoredAce>)
        -> StorageResult<()>;

    /// Reads ACEs matching the filter.
    async fn read_aces(&self, filter: &AceFilter) -> StorageResult<Vec<StoredAce>>;

    // Snapshot

    /// Returns an immutable view of the whole policy state.
    async fn snapshot(&self) -> StorageResult<Arc<PolicyTables>>;
}

fn validate_identifier(kind: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("{kind} cannot be empty"),
        });
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StorageError::InvalidInput {
            message: format!("{kind} exceeds {MAX_IDENTIFIER_LENGTH} characters"),
        });
    }
    if value.chars().any(char::is_control) {
        return Err(StorageError::InvalidInput {
            message: format!("{kind} contains control characters"),
        });
    }
    Ok(())
}

/// Validates a role name.
pub fn validate_role_name(name: &str) -> StorageResult<()> {
    validate_identifier("role name", name)
}

/// Validates a group id.
pub fn validate_group_id(group: &str) -> StorageResult<()> {
    validate_identifier("group id", group)
}

/// Validates a member identifier ("user:<id>" or "group:<id>").
pub fn validate_member(member: &str) -> StorageResult<()> {
    validate_identifier("member", member)?;
    let valid = member
        .split_once(':')
        .map_or(false, |(kind, id)| {
            matches!(kind, "user" | "group") && !id.is_empty()
        });
    if !valid {
        return Err(StorageError::InvalidInput {
            message: format!("member must be 'user:<id>' or 'group:<id>', got '{member}'"),
        });
    }
    Ok(())
}

/// Validates a permission identifier ("namespace.name").
pub fn validate_permission(permission: &str) -> StorageResult<()> {
    validate_identifier("permission", permission)?;
    let valid = permission
        .split_once('.')
        .map_or(false, |(ns, name)| !ns.is_empty() && !name.is_empty());
    if !valid {
        return Err(StorageError::InvalidInput {
            message: format!("permission must be 'namespace.name', got '{permission}'"),
        });
    }
    Ok(())
}

/// Validates an object key.
pub fn validate_object_key(key: &ObjectKey) -> StorageResult<()> {
    validate_identifier("object type", &key.object_type)?;
    validate_identifier("object id", &key.object_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_member() {
        assert!(validate_member("user:alice").is_ok());
        assert!(validate_member("group:eng").is_ok());
        assert!(validate_member("alice").is_err());
        assert!(validate_member("user:").is_err());
        assert!(validate_member("robot:r2").is_err());
    }

    #[test]
    fn test_validate_permission() {
        assert!(validate_permission("documents.document_view").is_ok());
        assert!(validate_permission("document_view").is_err());
        assert!(validate_permission("").is_err());
    }

    #[test]
    fn test_validate_identifier_length() {
        let long = "x".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_role_name(&long).is_err());
        assert!(validate_role_name("editors").is_ok());
        assert!(validate_role_name("bad\nname").is_err());
    }

    #[test]
    fn test_ace_filter_matches() {
        let ace = StoredAce::new(
            "documents.document_view",
            ObjectKey::new("document", "7"),
            "reviewers",
        );
        assert!(AceFilter::default().matches(&ace));
        assert!(AceFilter {
            role: Some("reviewers".to_string()),
            ..Default::default()
        }
        .matches(&ace));
        assert!(!AceFilter {
            object: Some(ObjectKey::new("document", "8")),
            ..Default::default()
        }
        .matches(&ace));
    }
}
