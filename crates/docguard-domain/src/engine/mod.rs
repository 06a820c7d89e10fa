//! Authorization engine.
//!
//! Decides whether a subject may exercise a permission on an object:
//!
//! 1. The permission must be registered; an unknown permission is a
//!    configuration defect and fails with [`DomainError::UnknownPermission`].
//! 2. Public permissions are allowed for everyone. Any other permission is
//!    denied as `Unauthorized` for the anonymous principal.
//! 3. A global grant through one of the subject's roles allows,
//!    regardless of the object.
//! 4. Otherwise the object is resolved to its check target and the ACEs
//!    on that target are consulted.
//!
//! Step 4 only runs after a definitive global deny. Failures to obtain a
//! snapshot, and group nesting deeper than the configured membership
//! depth, propagate as errors and are never turned into a deny.
//!
//! Every evaluation runs against a single [`PolicySnapshot`], so a check
//! never mixes state from before and after a concurrent mutation.

mod config;
mod types;

#[cfg(test)]
pub(crate) mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::acl::{AccessControlList, AclEntry};
use crate::error::{DomainError, DomainResult};
use crate::membership::Membership;
use crate::model::{ObjectRef, PermissionKey, Subject};
use crate::registry::PermissionRegistry;
use crate::resolver::{ResolveError, ResourceResolver};
use crate::traits::{PolicyReader, PolicySnapshot};

pub use config::EngineConfig;
pub use types::{AllowReason, Decision, DenyReason, EngineMetrics, EngineMetricsSnapshot};

/// Authorization engine over a policy reader.
pub struct AuthorizationEngine<R> {
    registry: Arc<PermissionRegistry>,
    reader: Arc<R>,
    resolver: ResourceResolver,
    config: EngineConfig,
    metrics: EngineMetrics,
}

impl<R> AuthorizationEngine<R>
where
    R: PolicyReader + 'static,
{
    /// Creates a new engine with the default configuration.
    pub fn new(registry: Arc<PermissionRegistry>, reader: Arc<R>) -> Self {
        Self::with_config(registry, reader, EngineConfig::default())
    }

    /// Creates a new engine with custom configuration.
    pub fn with_config(
        registry: Arc<PermissionRegistry>,
        reader: Arc<R>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            reader,
            resolver: ResourceResolver::new(config.max_resolution_hops),
            config,
            metrics: EngineMetrics::default(),
        }
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the decision counters for monitoring.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Checks `permission` for `subject` on `object`.
    #[instrument(skip_all, fields(subject = %subject, permission = %permission, object = %object))]
    pub async fn check(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        object: &ObjectRef,
    ) -> DomainResult<Decision> {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;
        let decision = self
            .evaluate(snapshot.as_ref(), subject, permission, Some(object))
            .map_err(|err| self.failed(err))?;
        self.metrics.record(&decision);
        debug!(?decision, revision = snapshot.revision(), "check evaluated");
        Ok(decision)
    }

    /// Checks `permission` for `subject` without a target object.
    ///
    /// Used for collection-level operations (listing, creating) where
    /// only a global grant can apply.
    #[instrument(skip_all, fields(subject = %subject, permission = %permission))]
    pub async fn check_global(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> DomainResult<Decision> {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;
        let decision = self
            .evaluate(snapshot.as_ref(), subject, permission, None)
            .map_err(|err| self.failed(err))?;
        self.metrics.record(&decision);
        debug!(?decision, revision = snapshot.revision(), "global check evaluated");
        Ok(decision)
    }

    /// Allows when any of `permissions` passes on `object` (or globally,
    /// when `object` is `None`).
    ///
    /// An empty permission list is denied. When every permission is
    /// denied because the object could not be resolved the result is
    /// `ObjectNotFound`, otherwise the first non-not-found reason.
    pub async fn check_any(
        &self,
        subject: &Subject,
        permissions: &[PermissionKey],
        object: Option<&ObjectRef>,
    ) -> DomainResult<Decision> {
        for permission in permissions {
            self.ensure_registered(permission)?;
        }
        if permissions.is_empty() {
            return Ok(Decision::Deny(DenyReason::PermissionDenied));
        }

        let snapshot = self.snapshot().await?;
        let mut denial: Option<DenyReason> = None;
        for permission in permissions {
            let decision = self
                .evaluate(snapshot.as_ref(), subject, permission, object)
                .map_err(|err| self.failed(err))?;
            match decision {
                allowed @ Decision::Allow(_) => {
                    self.metrics.record(&allowed);
                    return Ok(allowed);
                }
                Decision::Deny(reason) => {
                    denial = match denial {
                        None | Some(DenyReason::ObjectNotFound) => Some(reason),
                        kept => kept,
                    };
                }
            }
        }

        let decision = Decision::Deny(denial.unwrap_or(DenyReason::PermissionDenied));
        self.metrics.record(&decision);
        Ok(decision)
    }

    /// Keeps the objects `subject` may exercise `permission` on.
    ///
    /// A global grant keeps every object. Otherwise only objects with an
    /// ACE path survive; objects that cannot be resolved are dropped.
    #[instrument(skip_all, fields(subject = %subject, permission = %permission))]
    pub async fn filter_accessible<I>(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        objects: I,
    ) -> DomainResult<Vec<ObjectRef>>
    where
        I: IntoIterator<Item = ObjectRef> + Send,
    {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;

        let global = self
            .evaluate(snapshot.as_ref(), subject, permission, None)
            .map_err(|err| self.failed(err))?;
        if global.is_allowed() {
            return Ok(objects.into_iter().collect());
        }
        if subject.is_anonymous() {
            return Ok(Vec::new());
        }

        let acl = self.acl(snapshot.as_ref());
        let mut kept = Vec::new();
        for object in objects {
            let Ok(target) = self
                .resolver
                .resolve_for_check(snapshot.as_ref(), &object, permission)
            else {
                continue;
            };
            if acl
                .has_access(subject, permission, &target)
                .map_err(|err| self.failed(err))?
            {
                kept.push(object);
            }
        }
        debug!(kept = kept.len(), "filtered objects by object grants");
        Ok(kept)
    }

    /// Global permissions of `subject` through all reachable roles.
    pub async fn permissions_of(&self, subject: &Subject) -> DomainResult<BTreeSet<PermissionKey>> {
        let snapshot = self.snapshot().await?;
        self.membership(snapshot.as_ref())
            .permissions_of(subject)
            .map_err(|err| self.failed(err))
    }

    /// Whether `subject` holds `permission` globally.
    pub async fn has_permission(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> DomainResult<bool> {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;
        self.membership(snapshot.as_ref())
            .has_permission(subject, permission)
            .map_err(|err| self.failed(err))
    }

    /// Roles holding an ACE for `permission` on `target`.
    pub async fn roles_granted(
        &self,
        permission: &PermissionKey,
        target: &ObjectRef,
    ) -> DomainResult<BTreeSet<String>> {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;
        Ok(self.acl(snapshot.as_ref()).roles_granted(permission, target))
    }

    /// Whether an ACE on `target` itself grants `permission` to `subject`.
    ///
    /// No resolution and no global grants are considered.
    pub async fn has_access(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        target: &ObjectRef,
    ) -> DomainResult<bool> {
        self.ensure_registered(permission)?;
        let snapshot = self.snapshot().await?;
        self.acl(snapshot.as_ref())
            .has_access(subject, permission, target)
            .map_err(|err| self.failed(err))
    }

    /// Every ACE on `target`, grouped by role.
    pub async fn acl_entries(&self, target: &ObjectRef) -> DomainResult<Vec<AclEntry>> {
        let snapshot = self.snapshot().await?;
        Ok(self.acl(snapshot.as_ref()).entries_for(target))
    }

    fn evaluate(
        &self,
        snapshot: &dyn PolicySnapshot,
        subject: &Subject,
        permission: &PermissionKey,
        object: Option<&ObjectRef>,
    ) -> DomainResult<Decision> {
        if self.registry.is_public(permission) {
            return Ok(Decision::Allow(AllowReason::Public));
        }
        if subject.is_anonymous() {
            return Ok(Decision::Deny(DenyReason::Unauthorized));
        }

        if self
            .membership(snapshot)
            .has_permission(subject, permission)?
        {
            return Ok(Decision::Allow(AllowReason::GlobalGrant));
        }

        let Some(object) = object else {
            return Ok(Decision::Deny(DenyReason::PermissionDenied));
        };

        let target = match self.resolver.resolve_for_check(snapshot, object, permission) {
            Ok(target) => target,
            Err(err) => {
                if matches!(err, ResolveError::HopLimitExceeded { .. }) {
                    warn!(error = %err, "object graph owner chain too long");
                } else {
                    debug!(error = %err, "check target could not be resolved");
                }
                return Ok(Decision::Deny(DenyReason::ObjectNotFound));
            }
        };

        if self.acl(snapshot).has_access(subject, permission, &target)? {
            Ok(Decision::Allow(AllowReason::ObjectGrant))
        } else {
            Ok(Decision::Deny(DenyReason::PermissionDenied))
        }
    }

    fn failed(&self, err: DomainError) -> DomainError {
        self.metrics.record_error();
        err
    }

    fn ensure_registered(&self, permission: &PermissionKey) -> DomainResult<()> {
        if let Err(err) = self.registry.get(permission) {
            self.metrics.record_error();
            warn!(permission = %permission, "check referenced an unregistered permission");
            return Err(err);
        }
        Ok(())
    }

    async fn snapshot(&self) -> DomainResult<Arc<dyn PolicySnapshot>> {
        self.reader.snapshot().await.map_err(|err| {
            self.metrics.record_error();
            match err {
                DomainError::StorageError { .. } | DomainError::StorageUnavailable { .. } => err,
                other => DomainError::StorageError {
                    message: other.to_string(),
                },
            }
        })
    }

    fn membership<'a>(&self, snapshot: &'a dyn PolicySnapshot) -> Membership<'a> {
        Membership::new(snapshot, self.config.max_membership_depth)
    }

    fn acl<'a>(&self, snapshot: &'a dyn PolicySnapshot) -> AccessControlList<'a> {
        AccessControlList::new(snapshot, self.config.max_membership_depth)
    }
}
