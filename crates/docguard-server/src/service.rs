//! Access-control service.
//!
//! `AccessControl` is what request handlers talk to. It owns the shared
//! permission registry, the policy store and the engine reading from it,
//! and offers three groups of operations:
//!
//! - checks (`require_permission`, `require_access`, `check_any`,
//!   `filter_accessible`) that turn decisions into [`AccessError`]s
//! - administrative mutations of roles, groups, objects and ACEs, validated
//!   against the registry before they reach the store
//! - read-side queries used by the role and ACL screens

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use docguard_domain::acl::AclEntry;
use docguard_domain::engine::EngineMetricsSnapshot;
use docguard_domain::registry::catalog;
use docguard_domain::{
    AuthorizationEngine, Decision, DomainError, DomainResult, EngineConfig, ObjectRef,
    PermissionKey, PermissionRegistry, Subject,
};
use docguard_storage::{PolicyStore, StoredAce, StoredRole};

use crate::adapters::{member_id, object_key, StorePolicyReader};
use crate::config::{RegistrySettings, ServerConfig};
use crate::errors::{AccessError, AccessResult};

/// Builds the process-wide registry from configuration.
///
/// Public permissions must name registered permissions.
pub fn build_registry(settings: &RegistrySettings) -> DomainResult<PermissionRegistry> {
    let mut registry = PermissionRegistry::new();
    if settings.builtin_catalog {
        catalog::register_builtin(&mut registry)?;
    }
    for value in &settings.public_permissions {
        let key = PermissionKey::parse(value)?;
        registry.mark_public(&key)?;
    }
    info!(
        permissions = registry.len(),
        public = settings.public_permissions.len(),
        "permission registry initialised"
    );
    Ok(registry)
}

/// Authorization facade over a policy store.
pub struct AccessControl<S: PolicyStore> {
    registry: Arc<PermissionRegistry>,
    store: Arc<S>,
    engine: AuthorizationEngine<StorePolicyReader<S>>,
}

impl<S: PolicyStore> AccessControl<S> {
    pub fn new(registry: Arc<PermissionRegistry>, store: Arc<S>, config: EngineConfig) -> Self {
        let reader = Arc::new(StorePolicyReader::new(Arc::clone(&store)));
        let engine = AuthorizationEngine::with_config(Arc::clone(&registry), reader, config);
        Self {
            registry,
            store,
            engine,
        }
    }

    /// Builds the registry and engine limits from `config`.
    pub fn from_config(config: &ServerConfig, store: Arc<S>) -> DomainResult<Self> {
        let registry = build_registry(&config.registry)?;
        Ok(Self::new(
            Arc::new(registry),
            store,
            config.engine.to_engine_config(),
        ))
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn engine(&self) -> &AuthorizationEngine<StorePolicyReader<S>> {
        &self.engine
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.engine.metrics().snapshot()
    }

    // Checks

    /// Full decision for `permission` on `object`.
    pub async fn check(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        object: &ObjectRef,
    ) -> AccessResult<Decision> {
        Ok(self.engine.check(subject, permission, object).await?)
    }

    /// Collection-level check: only a global grant (or a public
    /// permission) passes.
    pub async fn require_permission(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> AccessResult<()> {
        let decision = self.engine.check_global(subject, permission).await?;
        into_result(decision)
    }

    /// Object-level check: a global grant, else an ACE on the resolved
    /// target.
    pub async fn require_access(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        object: &ObjectRef,
    ) -> AccessResult<()> {
        let decision = self.engine.check(subject, permission, object).await?;
        into_result(decision)
    }

    /// Passes when any of `permissions` passes.
    pub async fn check_any(
        &self,
        subject: &Subject,
        permissions: &[PermissionKey],
        object: Option<&ObjectRef>,
    ) -> AccessResult<Decision> {
        Ok(self.engine.check_any(subject, permissions, object).await?)
    }

    pub async fn require_any(
        &self,
        subject: &Subject,
        permissions: &[PermissionKey],
        object: Option<&ObjectRef>,
    ) -> AccessResult<()> {
        let decision = self.check_any(subject, permissions, object).await?;
        into_result(decision)
    }

    /// Narrows a listing to the objects `subject` may see.
    pub async fn filter_accessible(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        objects: Vec<ObjectRef>,
    ) -> AccessResult<Vec<ObjectRef>> {
        Ok(self
            .engine
            .filter_accessible(subject, permission, objects)
            .await?)
    }

    // Role administration

    #[instrument(skip(self))]
    pub async fn create_role(&self, name: &str) -> AccessResult<StoredRole> {
        Ok(self.store.create_role(name).await?)
    }

    /// Deletes a role; its ACEs go with it.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, name: &str) -> AccessResult<()> {
        Ok(self.store.delete_role(name).await?)
    }

    pub async fn list_roles(&self) -> AccessResult<Vec<StoredRole>> {
        Ok(self.store.list_roles().await?)
    }

    #[instrument(skip(self), fields(permission = %permission))]
    pub async fn grant(&self, role: &str, permission: &PermissionKey) -> AccessResult<()> {
        self.ensure_registered(permission)?;
        Ok(self
            .store
            .grant_permission(role, &permission.to_string())
            .await?)
    }

    #[instrument(skip(self), fields(permission = %permission))]
    pub async fn revoke(&self, role: &str, permission: &PermissionKey) -> AccessResult<()> {
        self.ensure_registered(permission)?;
        Ok(self
            .store
            .revoke_permission(role, &permission.to_string())
            .await?)
    }

    #[instrument(skip(self), fields(member = %member))]
    pub async fn add_member(&self, role: &str, member: &Subject) -> AccessResult<()> {
        let member = require_member(member)?;
        Ok(self.store.add_role_member(role, &member).await?)
    }

    #[instrument(skip(self), fields(member = %member))]
    pub async fn remove_member(&self, role: &str, member: &Subject) -> AccessResult<()> {
        let member = require_member(member)?;
        Ok(self.store.remove_role_member(role, &member).await?)
    }

    // Group administration

    #[instrument(skip(self), fields(member = %member))]
    pub async fn add_group_member(&self, group: &str, member: &Subject) -> AccessResult<()> {
        let member = require_member(member)?;
        Ok(self.store.add_group_member(group, &member).await?)
    }

    #[instrument(skip(self), fields(member = %member))]
    pub async fn remove_group_member(&self, group: &str, member: &Subject) -> AccessResult<()> {
        let member = require_member(member)?;
        Ok(self.store.remove_group_member(group, &member).await?)
    }

    // Object graph

    /// Registers `object`, optionally owned by `owner`. The owner must
    /// already exist.
    #[instrument(skip(self), fields(object = %object))]
    pub async fn register_object(
        &self,
        object: &ObjectRef,
        owner: Option<&ObjectRef>,
    ) -> AccessResult<()> {
        self.store
            .put_object(object_key(object), owner.map(object_key))
            .await?;
        Ok(())
    }

    /// Deletes `object` and every ACE targeting it.
    #[instrument(skip(self), fields(object = %object))]
    pub async fn delete_object(&self, object: &ObjectRef) -> AccessResult<()> {
        Ok(self.store.delete_object(&object_key(object)).await?)
    }

    // Access control entries

    /// Grants `permission` on `target` to `role`. Idempotent.
    #[instrument(skip(self), fields(permission = %permission, target = %target))]
    pub async fn grant_on_object(
        &self,
        permission: &PermissionKey,
        target: &ObjectRef,
        role: &str,
    ) -> AccessResult<()> {
        self.ensure_registered(permission)?;
        ensure_ace_target(target)?;
        let ace = StoredAce::new(permission.to_string(), object_key(target), role);
        Ok(self.store.write_aces(vec![ace], Vec::new()).await?)
    }

    /// Removes an ACE; absent entries are ignored.
    #[instrument(skip(self), fields(permission = %permission, target = %target))]
    pub async fn revoke_on_object(
        &self,
        permission: &PermissionKey,
        target: &ObjectRef,
        role: &str,
    ) -> AccessResult<()> {
        self.ensure_registered(permission)?;
        ensure_ace_target(target)?;
        let ace = StoredAce::new(permission.to_string(), object_key(target), role);
        Ok(self.store.write_aces(Vec::new(), vec![ace]).await?)
    }

    // Queries

    pub async fn roles_granted(
        &self,
        permission: &PermissionKey,
        target: &ObjectRef,
    ) -> AccessResult<BTreeSet<String>> {
        Ok(self.engine.roles_granted(permission, target).await?)
    }

    pub async fn has_access(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        target: &ObjectRef,
    ) -> AccessResult<bool> {
        Ok(self.engine.has_access(subject, permission, target).await?)
    }

    pub async fn has_permission(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> AccessResult<bool> {
        Ok(self.engine.has_permission(subject, permission).await?)
    }

    pub async fn permissions_of(&self, subject: &Subject) -> AccessResult<BTreeSet<PermissionKey>> {
        Ok(self.engine.permissions_of(subject).await?)
    }

    /// The ACL of `target`, visible to holders of `acls.acl_view` on it.
    pub async fn acl_entries_for(
        &self,
        subject: &Subject,
        target: &ObjectRef,
    ) -> AccessResult<Vec<AclEntry>> {
        self.require_access(subject, &catalog::ACL_VIEW.key(), target)
            .await?;
        Ok(self.engine.acl_entries(target).await?)
    }

    fn ensure_registered(&self, permission: &PermissionKey) -> AccessResult<()> {
        if let Err(err) = self.registry.get(permission) {
            warn!(permission = %permission, "rejected reference to unregistered permission");
            return Err(err.into());
        }
        Ok(())
    }
}

fn into_result(decision: Decision) -> AccessResult<()> {
    match decision.deny_reason() {
        None => Ok(()),
        Some(reason) => Err(reason.into()),
    }
}

fn require_member(subject: &Subject) -> AccessResult<String> {
    member_id(subject).ok_or_else(|| {
        warn!("anonymous principal cannot be a member");
        AccessError::Domain(DomainError::InvalidSubjectFormat {
            value: subject.to_string(),
        })
    })
}

fn ensure_ace_target(target: &ObjectRef) -> AccessResult<()> {
    if !target.kind.accepts_aces() {
        warn!(target = %target, "rejected access control entry on non-target kind");
        return Err(AccessError::Domain(DomainError::InvalidAceTarget {
            kind: target.kind.to_string(),
        }));
    }
    Ok(())
}
