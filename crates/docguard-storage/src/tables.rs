//! Materialized policy state.
//!
//! `PolicyTables` holds roles, group memberships, the object graph and
//! ACEs together with the reverse indexes the engine needs (member →
//! roles, member → groups). A snapshot handed to readers is an
//! `Arc<PolicyTables>` and is never mutated afterwards; the store applies
//! mutations copy-on-write.

use std::collections::{BTreeSet, HashMap};

use crate::error::{StorageError, StorageResult};
use crate::traits::{AceFilter, ObjectKey, StoredAce, StoredObject, StoredRole};

#[derive(Debug, Clone, Default)]
pub struct PolicyTables {
    pub(crate) revision: u64,
    roles: HashMap<String, StoredRole>,
    /// member → roles it belongs to directly
    role_memberships: HashMap<String, BTreeSet<String>>,
    /// group id → direct members
    groups: HashMap<String, BTreeSet<String>>,
    /// member → groups it belongs to directly
    group_memberships: HashMap<String, BTreeSet<String>>,
    /// (permission, object) → roles
    aces: HashMap<(String, ObjectKey), BTreeSet<String>>,
    objects: HashMap<ObjectKey, StoredObject>,
}

impl PolicyTables {
    /// Revision of the last applied mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn role(&self, name: &str) -> Option<&StoredRole> {
        self.roles.get(name)
    }

    /// All roles, ordered by name.
    pub fn roles(&self) -> Vec<&StoredRole> {
        let mut roles: Vec<&StoredRole> = self.roles.values().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Globally granted permissions of a role; empty for unknown roles.
    pub fn role_permissions(&self, role: &str) -> impl Iterator<Item = &String> {
        self.roles
            .get(role)
            .into_iter()
            .flat_map(|role| role.permissions.iter())
    }

    /// Roles `member` belongs to directly.
    pub fn roles_of_member(&self, member: &str) -> impl Iterator<Item = &String> {
        self.role_memberships
            .get(member)
            .into_iter()
            .flat_map(|roles| roles.iter())
    }

    /// Groups `member` belongs to directly.
    pub fn groups_of_member(&self, member: &str) -> impl Iterator<Item = &String> {
        self.group_memberships
            .get(member)
            .into_iter()
            .flat_map(|groups| groups.iter())
    }

    /// Direct members of a group.
    pub fn group_members(&self, group: &str) -> impl Iterator<Item = &String> {
        self.groups.get(group).into_iter().flat_map(|m| m.iter())
    }

    /// Roles holding an ACE for `permission` on `object`.
    pub fn ace_roles(&self, permission: &str, object: &ObjectKey) -> impl Iterator<Item = &String> {
        self.aces
            .get(&(permission.to_string(), object.clone()))
            .into_iter()
            .flat_map(|roles| roles.iter())
    }

    /// ACEs matching the filter, sorted.
    pub fn read_aces(&self, filter: &AceFilter) -> Vec<StoredAce> {
        let mut aces: Vec<StoredAce> = self
            .aces
            .iter()
            .flat_map(|((permission, object), roles)| {
                roles
                    .iter()
                    .map(move |role| StoredAce::new(permission.clone(), object.clone(), role.clone()))
            })
            .filter(|ace| filter.matches(ace))
            .collect();
        aces.sort();
        aces
    }

    pub fn object(&self, key: &ObjectKey) -> Option<&StoredObject> {
        self.objects.get(key)
    }

    pub fn contains_object(&self, key: &ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn ace_count(&self) -> usize {
        self.aces.values().map(BTreeSet::len).sum()
    }

    // Mutations. Each validates everything it depends on before it
    // changes anything, so a failed mutation leaves the tables untouched.

    pub(crate) fn insert_role(&mut self, role: StoredRole) -> StorageResult<StoredRole> {
        if self.roles.contains_key(&role.name) {
            return Err(StorageError::RoleAlreadyExists { role: role.name });
        }
        self.roles.insert(role.name.clone(), role.clone());
        Ok(role)
    }

    pub(crate) fn remove_role(&mut self, name: &str) -> StorageResult<()> {
        let role = self
            .roles
            .remove(name)
            .ok_or_else(|| StorageError::RoleNotFound {
                role: name.to_string(),
            })?;
        for member in &role.members {
            remove_from_index(&mut self.role_memberships, member, name);
        }
        self.aces.retain(|_, roles| {
            roles.remove(name);
            !roles.is_empty()
        });
        Ok(())
    }

    pub(crate) fn role_mut(&mut self, name: &str) -> StorageResult<&mut StoredRole> {
        self.roles
            .get_mut(name)
            .ok_or_else(|| StorageError::RoleNotFound {
                role: name.to_string(),
            })
    }

    pub(crate) fn insert_role_member(
        &mut self,
        role: &str,
        member: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StorageResult<()> {
        let stored = self.role_mut(role)?;
        if stored.members.insert(member.to_string()) {
            stored.updated_at = now;
        }
        self.role_memberships
            .entry(member.to_string())
            .or_default()
            .insert(role.to_string());
        Ok(())
    }

    pub(crate) fn remove_role_member(
        &mut self,
        role: &str,
        member: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StorageResult<()> {
        let stored = self.role_mut(role)?;
        if stored.members.remove(member) {
            stored.updated_at = now;
        }
        remove_from_index(&mut self.role_memberships, member, role);
        Ok(())
    }

    pub(crate) fn insert_group_member(&mut self, group: &str, member: &str) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(member.to_string());
        self.group_memberships
            .entry(member.to_string())
            .or_default()
            .insert(group.to_string());
    }

    pub(crate) fn remove_group_member(&mut self, group: &str, member: &str) {
        remove_from_index(&mut self.groups, group, member);
        remove_from_index(&mut self.group_memberships, member, group);
    }

    pub(crate) fn upsert_object(
        &mut self,
        key: ObjectKey,
        owner: Option<ObjectKey>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StorageResult<StoredObject> {
        if let Some(owner) = &owner {
            if *owner == key {
                return Err(StorageError::InvalidInput {
                    message: format!("object {key} cannot own itself"),
                });
            }
            if !self.objects.contains_key(owner) {
                return Err(StorageError::ObjectNotFound {
                    object: owner.to_string(),
                });
            }
        }
        let created_at = self.objects.get(&key).map_or(now, |o| o.created_at);
        let object = StoredObject {
            key: key.clone(),
            owner,
            created_at,
        };
        self.objects.insert(key, object.clone());
        Ok(object)
    }

    pub(crate) fn remove_object(&mut self, key: &ObjectKey) -> StorageResult<()> {
        if self.objects.remove(key).is_none() {
            return Err(StorageError::ObjectNotFound {
                object: key.to_string(),
            });
        }
        self.aces.retain(|(_, object), _| object != key);
        Ok(())
    }

    pub(crate) fn apply_aces(
        &mut self,
        writes: Vec<StoredAce>,
        deletes: Vec<StoredAce>,
    ) -> StorageResult<()> {
        for ace in &writes {
            if !self.roles.contains_key(&ace.role) {
                return Err(StorageError::RoleNotFound {
                    role: ace.role.clone(),
                });
            }
            if !self.objects.contains_key(&ace.object) {
                return Err(StorageError::ObjectNotFound {
                    object: ace.object.to_string(),
                });
            }
        }

        for ace in deletes {
            let key = (ace.permission, ace.object);
            if let Some(roles) = self.aces.get_mut(&key) {
                roles.remove(&ace.role);
                if roles.is_empty() {
                    self.aces.remove(&key);
                }
            }
        }
        for ace in writes {
            self.aces
                .entry((ace.permission, ace.object))
                .or_default()
                .insert(ace.role);
        }
        Ok(())
    }
}

fn remove_from_index(index: &mut HashMap<String, BTreeSet<String>>, key: &str, value: &str) {
    if let Some(values) = index.get_mut(key) {
        values.remove(value);
        if values.is_empty() {
            index.remove(key);
        }
    }
}
