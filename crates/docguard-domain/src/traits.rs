//! Traits for policy state access needed by the engine.
//!
//! The engine never reads a backing store piecemeal. Every decision is
//! evaluated against one [`PolicySnapshot`] obtained from a
//! [`PolicyReader`], so role membership, role permissions, ACEs and the
//! object graph are observed at a single point in time.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{ObjectRef, PermissionKey, Subject};

/// A consistent, immutable view of the policy state.
pub trait PolicySnapshot: Send + Sync {
    /// Monotonic revision of the state this snapshot was taken from.
    fn revision(&self) -> u64;

    /// Permissions granted globally to a role. Empty for unknown roles.
    fn role_permissions(&self, role: &str) -> Vec<PermissionKey>;

    /// Roles the subject is a direct member of.
    fn direct_roles(&self, subject: &Subject) -> Vec<String>;

    /// Groups the subject is a direct member of.
    fn direct_groups(&self, subject: &Subject) -> Vec<String>;

    /// Roles holding an ACE for `permission` on `target`.
    fn ace_roles(&self, permission: &PermissionKey, target: &ObjectRef) -> Vec<String>;

    /// Every (permission, role) ACE targeting `target`.
    fn ace_entries(&self, target: &ObjectRef) -> Vec<(PermissionKey, String)>;

    /// Whether the object is registered in the object graph.
    fn object_exists(&self, object: &ObjectRef) -> bool;

    /// The owning object, for objects that have one (node → index,
    /// document → document type, page → document, ...).
    fn owner_of(&self, object: &ObjectRef) -> Option<ObjectRef>;
}

/// Source of policy snapshots.
#[async_trait]
pub trait PolicyReader: Send + Sync {
    /// Takes a snapshot of the current policy state.
    async fn snapshot(&self) -> DomainResult<Arc<dyn PolicySnapshot>>;
}
