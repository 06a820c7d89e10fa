//! Object-scoped grants (access control entries).
//!
//! An ACE `(permission, target, role)` grants `permission` on exactly one
//! target object to every member of `role`, regardless of the role's
//! global permissions.

use std::collections::BTreeSet;

use crate::error::DomainResult;
use crate::membership::Membership;
use crate::model::{ObjectRef, PermissionKey, Subject};
use crate::traits::PolicySnapshot;

/// ACE queries over a policy snapshot.
pub struct AccessControlList<'a> {
    snapshot: &'a dyn PolicySnapshot,
    membership: Membership<'a>,
}

impl<'a> AccessControlList<'a> {
    pub fn new(snapshot: &'a dyn PolicySnapshot, max_membership_depth: u32) -> Self {
        Self {
            snapshot,
            membership: Membership::new(snapshot, max_membership_depth),
        }
    }

    /// Roles holding `permission` on `target` through an ACE.
    pub fn roles_granted(&self, permission: &PermissionKey, target: &ObjectRef) -> BTreeSet<String> {
        self.snapshot.ace_roles(permission, target).into_iter().collect()
    }

    /// Whether some role granted `permission` on `target` has the subject
    /// as a (possibly transitive) member.
    pub fn has_access(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
        target: &ObjectRef,
    ) -> DomainResult<bool> {
        let granted = self.roles_granted(permission, target);
        if granted.is_empty() {
            return Ok(false);
        }
        Ok(self
            .membership
            .roles_of(subject)?
            .iter()
            .any(|role| granted.contains(role)))
    }

    /// Every ACE on `target`, grouped by role.
    pub fn entries_for(&self, target: &ObjectRef) -> Vec<AclEntry> {
        let mut entries: Vec<AclEntry> = Vec::new();
        let mut pairs = self.snapshot.ace_entries(target);
        pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        for (permission, role) in pairs {
            match entries.last_mut() {
                Some(entry) if entry.role == role => {
                    entry.permissions.insert(permission);
                }
                _ => entries.push(AclEntry {
                    role,
                    permissions: BTreeSet::from([permission]),
                }),
            }
        }
        entries
    }
}

/// The permissions one role holds on one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub role: String,
    pub permissions: BTreeSet<PermissionKey>,
}
