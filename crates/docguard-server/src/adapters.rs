//! Adapters that bridge the storage layer to the domain layer.
//!
//! The domain crate evaluates checks against a `PolicySnapshot` obtained
//! from a `PolicyReader`. The storage crate knows nothing about domain
//! types; it keeps permissions, members and object keys as strings. This
//! module implements the domain traits over a `PolicyStore` and owns the
//! string ↔ domain conversions.

use std::sync::Arc;

use async_trait::async_trait;

use docguard_domain::error::{DomainError, DomainResult};
use docguard_domain::{ObjectKind, ObjectRef, PermissionKey, PolicyReader, PolicySnapshot, Subject};
use docguard_storage::{AceFilter, ObjectKey, PolicyStore, PolicyTables, StorageError};

/// Adapter that implements `PolicyReader` using a `PolicyStore`.
pub struct StorePolicyReader<S: PolicyStore> {
    storage: Arc<S>,
}

impl<S: PolicyStore> StorePolicyReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: PolicyStore> PolicyReader for StorePolicyReader<S> {
    async fn snapshot(&self) -> DomainResult<Arc<dyn PolicySnapshot>> {
        let tables = self.storage.snapshot().await.map_err(storage_error)?;
        let snapshot: Arc<dyn PolicySnapshot> = Arc::new(TablesSnapshot::new(tables));
        Ok(snapshot)
    }
}

/// `PolicySnapshot` view over one immutable [`PolicyTables`] instance.
pub struct TablesSnapshot {
    tables: Arc<PolicyTables>,
}

impl TablesSnapshot {
    pub fn new(tables: Arc<PolicyTables>) -> Self {
        Self { tables }
    }
}

impl PolicySnapshot for TablesSnapshot {
    fn revision(&self) -> u64 {
        self.tables.revision()
    }

    fn role_permissions(&self, role: &str) -> Vec<PermissionKey> {
        // Stored permissions were validated on write; anything unparsable
        // grants nothing.
        self.tables
            .role_permissions(role)
            .filter_map(|permission| PermissionKey::parse(permission).ok())
            .collect()
    }

    fn direct_roles(&self, subject: &Subject) -> Vec<String> {
        match member_id(subject) {
            Some(member) => self.tables.roles_of_member(&member).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn direct_groups(&self, subject: &Subject) -> Vec<String> {
        match member_id(subject) {
            Some(member) => self.tables.groups_of_member(&member).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn ace_roles(&self, permission: &PermissionKey, target: &ObjectRef) -> Vec<String> {
        self.tables
            .ace_roles(&permission.to_string(), &object_key(target))
            .cloned()
            .collect()
    }

    fn ace_entries(&self, target: &ObjectRef) -> Vec<(PermissionKey, String)> {
        let filter = AceFilter {
            object: Some(object_key(target)),
            ..Default::default()
        };
        self.tables
            .read_aces(&filter)
            .into_iter()
            .filter_map(|ace| {
                PermissionKey::parse(&ace.permission)
                    .ok()
                    .map(|permission| (permission, ace.role))
            })
            .collect()
    }

    fn object_exists(&self, object: &ObjectRef) -> bool {
        self.tables.contains_object(&object_key(object))
    }

    fn owner_of(&self, object: &ObjectRef) -> Option<ObjectRef> {
        self.tables
            .object(&object_key(object))?
            .owner
            .as_ref()
            .and_then(|owner| object_ref(owner).ok())
    }
}

/// Storage member identifier for a subject; the anonymous principal has none.
pub fn member_id(subject: &Subject) -> Option<String> {
    (!subject.is_anonymous()).then(|| subject.to_string())
}

pub fn object_key(object: &ObjectRef) -> ObjectKey {
    ObjectKey::new(object.kind.as_str(), object.id.clone())
}

pub fn object_ref(key: &ObjectKey) -> DomainResult<ObjectRef> {
    let kind: ObjectKind = key.object_type.parse()?;
    Ok(ObjectRef::new(kind, key.object_id.clone()))
}

/// Converts a storage failure, keeping an unreachable store distinguishable.
pub fn storage_error(err: StorageError) -> DomainError {
    match err {
        StorageError::ConnectionError { .. } => DomainError::StorageUnavailable {
            message: err.to_string(),
        },
        other => DomainError::StorageError {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docguard_storage::{MemoryPolicyStore, StoredAce};

    #[tokio::test]
    async fn test_snapshot_translates_tables() {
        let store = MemoryPolicyStore::new_shared();
        store.create_role("editors").await.unwrap();
        store
            .grant_permission("editors", "documents.document_edit")
            .await
            .unwrap();
        store.add_role_member("editors", "group:eng").await.unwrap();
        store.add_group_member("eng", "user:alice").await.unwrap();
        store
            .put_object(ObjectKey::new("document_type", "invoice"), None)
            .await
            .unwrap();
        store
            .put_object(
                ObjectKey::new("document", "7"),
                Some(ObjectKey::new("document_type", "invoice")),
            )
            .await
            .unwrap();
        store
            .write_aces(
                vec![StoredAce::new(
                    "documents.document_view",
                    ObjectKey::new("document", "7"),
                    "editors",
                )],
                vec![],
            )
            .await
            .unwrap();

        let reader = StorePolicyReader::new(Arc::clone(&store));
        let snapshot = reader.snapshot().await.unwrap();

        assert_eq!(snapshot.revision(), 7);
        assert_eq!(
            snapshot.role_permissions("editors"),
            vec![PermissionKey::new("documents", "document_edit")]
        );
        assert_eq!(snapshot.direct_groups(&Subject::user("alice")), vec!["eng"]);
        assert_eq!(snapshot.direct_roles(&Subject::group("eng")), vec!["editors"]);
        assert!(snapshot.direct_roles(&Subject::Anonymous).is_empty());

        let document = ObjectRef::document("7");
        assert!(snapshot.object_exists(&document));
        assert_eq!(
            snapshot.owner_of(&document),
            Some(ObjectRef::document_type("invoice"))
        );
        assert_eq!(
            snapshot.ace_roles(&PermissionKey::new("documents", "document_view"), &document),
            vec!["editors"]
        );
        assert_eq!(
            snapshot.ace_entries(&document),
            vec![(
                PermissionKey::new("documents", "document_view"),
                "editors".to_string()
            )]
        );
    }

    #[test]
    fn test_object_key_conversions() {
        let node = ObjectRef::index_instance_node("42");
        let key = object_key(&node);
        assert_eq!(key.to_string(), "index_instance_node:42");
        assert_eq!(object_ref(&key).unwrap(), node);

        let unknown = ObjectKey::new("cabinet", "1");
        assert!(matches!(
            object_ref(&unknown),
            Err(DomainError::InvalidObjectFormat { .. })
        ));
    }

    #[test]
    fn test_storage_error_keeps_unavailability() {
        let err = storage_error(StorageError::ConnectionError {
            message: "refused".to_string(),
        });
        assert!(matches!(err, DomainError::StorageUnavailable { .. }));

        let err = storage_error(StorageError::InternalError {
            message: "corrupt".to_string(),
        });
        assert!(matches!(err, DomainError::StorageError { .. }));
    }

    #[test]
    fn test_member_id() {
        assert_eq!(member_id(&Subject::user("alice")).as_deref(), Some("user:alice"));
        assert_eq!(member_id(&Subject::group("eng")).as_deref(), Some("group:eng"));
        assert_eq!(member_id(&Subject::Anonymous), None);
    }
}
