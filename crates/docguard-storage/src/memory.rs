//! In-memory policy store.
//!
//! State lives in a single `Arc<PolicyTables>` behind a `tokio` RwLock.
//! Readers clone the `Arc` and never block writers for longer than the
//! clone. Writers take the lock exclusively and mutate copy-on-write via
//! `Arc::make_mut`, so an outstanding snapshot keeps seeing the state it
//! was taken from.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};
use crate::tables::PolicyTables;
use crate::traits::{
    validate_group_id, validate_member, validate_object_key, validate_permission,
    validate_role_name, AceFilter, ObjectKey, PolicyStore, StoredAce, StoredObject, StoredRole,
};

/// In-memory implementation of [`PolicyStore`].
///
/// # Consistency
///
/// - Every mutation is applied under the write lock and bumps the revision
///   exactly once, so mutations are serialized and none is lost.
/// - A mutation that fails validation leaves the state and the revision
///   unchanged.
/// - [`PolicyStore::snapshot`] is O(1): it clones the current `Arc`.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    state: RwLock<Arc<PolicyTables>>,
}

impl MemoryPolicyStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Applies `f` to the tables under the write lock.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut PolicyTables) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut guard = self.state.write().await;
        // Clones only while a snapshot of the current state is still held.
        // Table mutations validate before they write, so an error here
        // leaves the tables as they were.
        let tables = Arc::make_mut(&mut guard);
        let value = f(tables)?;
        tables.revision += 1;
        debug!(revision = tables.revision, "policy state updated");
        Ok(value)
    }

    async fn current(&self) -> Arc<PolicyTables> {
        Arc::clone(&*self.state.read().await)
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    #[instrument(skip(self))]
    async fn create_role(&self, name: &str) -> StorageResult<StoredRole> {
        validate_role_name(name)?;

        let now = chrono::Utc::now();
        let role = StoredRole {
            name: name.to_string(),
            permissions: Default::default(),
            members: Default::default(),
            created_at: now,
            updated_at: now,
        };
        self.mutate(|tables| tables.insert_role(role)).await
    }

    async fn get_role(&self, name: &str) -> StorageResult<StoredRole> {
        self.current()
            .await
            .role(name)
            .cloned()
            .ok_or_else(|| StorageError::RoleNotFound {
                role: name.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, name: &str) -> StorageResult<()> {
        self.mutate(|tables| tables.remove_role(name)).await
    }

    async fn list_roles(&self) -> StorageResult<Vec<StoredRole>> {
        Ok(self
            .current()
            .await
            .roles()
            .into_iter()
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn grant_permission(&self, role: &str, permission: &str) -> StorageResult<()> {
        validate_permission(permission)?;

        let now = chrono::Utc::now();
        self.mutate(|tables| {
            let stored = tables.role_mut(role)?;
            if stored.permissions.insert(permission.to_string()) {
                stored.updated_at = now;
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn revoke_permission(&self, role: &str, permission: &str) -> StorageResult<()> {
        validate_permission(permission)?;

        let now = chrono::Utc::now();
        self.mutate(|tables| {
            let stored = tables.role_mut(role)?;
            if stored.permissions.remove(permission) {
                stored.updated_at = now;
            }
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn add_role_member(&self, role: &str, member: &str) -> StorageResult<()> {
        validate_member(member)?;

        let now = chrono::Utc::now();
        self.mutate(|tables| tables.insert_role_member(role, member, now))
            .await
    }

    #[instrument(skip(self))]
    async fn remove_role_member(&self, role: &str, member: &str) -> StorageResult<()> {
        validate_member(member)?;

        let now = chrono::Utc::now();
        self.mutate(|tables| tables.remove_role_member(role, member, now))
            .await
    }

    #[instrument(skip(self))]
    async fn add_group_member(&self, group: &str, member: &str) -> StorageResult<()> {
        validate_group_id(group)?;
        validate_member(member)?;

        self.mutate(|tables| {
            tables.insert_group_member(group, member);
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove_group_member(&self, group: &str, member: &str) -> StorageResult<()> {
        validate_group_id(group)?;
        validate_member(member)?;

        self.mutate(|tables| {
            tables.remove_group_member(group, member);
            Ok(())
        })
        .await
    }

    async fn list_group_members(&self, group: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .current()
            .await
            .group_members(group)
            .cloned()
            .collect())
    }

    #[instrument(skip(self), fields(object = %key))]
    async fn put_object(
        &self,
        key: ObjectKey,
        owner: Option<ObjectKey>,
    ) -> StorageResult<StoredObject> {
        validate_object_key(&key)?;
        if let Some(owner) = &owner {
            validate_object_key(owner)?;
        }

        let now = chrono::Utc::now();
        self.mutate(|tables| tables.upsert_object(key, owner, now))
            .await
    }

    async fn get_object(&self, key: &ObjectKey) -> StorageResult<StoredObject> {
        self.current()
            .await
            .object(key)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                object: key.to_string(),
            })
    }

    #[instrument(skip(self), fields(object = %key))]
    async fn delete_object(&self, key: &ObjectKey) -> StorageResult<()> {
        self.mutate(|tables| tables.remove_object(key)).await
    }

    #[instrument(skip(self, writes, deletes), fields(writes = writes.len(), deletes = deletes.len()))]
    async fn write_aces(
        &self,
        writes: Vec<StoredAce>,
        deletes: Vec<StoredAce>,
    ) -> StorageResult<()> {
        for ace in writes.iter().chain(deletes.iter()) {
            validate_permission(&ace.permission)?;
            validate_object_key(&ace.object)?;
            validate_role_name(&ace.role)?;
        }

        self.mutate(|tables| tables.apply_aces(writes, deletes))
            .await
    }

    async fn read_aces(&self, filter: &AceFilter) -> StorageResult<Vec<StoredAce>> {
        Ok(self.current().await.read_aces(filter))
    }

    async fn snapshot(&self) -> StorageResult<Arc<PolicyTables>> {
        Ok(self.current().await)
    }
}
