//! Permission registry.
//!
//! The registry is the process-wide catalog of permission identifiers,
//! grouped into namespaces. It is built explicitly at startup through
//! `&mut` registration and then shared read-only (usually as
//! `Arc<PermissionRegistry>`) with the engine and the services that
//! validate permission references. Nothing is ever removed.

pub mod catalog;

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{Permission, PermissionKey};

/// Append-only catalog of registered permissions.
#[derive(Debug, Default, Clone)]
pub struct PermissionRegistry {
    /// Namespace id → namespace label.
    namespaces: BTreeMap<String, String>,
    permissions: BTreeMap<PermissionKey, Permission>,
    /// Permissions that anonymous principals may exercise.
    public: HashSet<PermissionKey>,
}

impl PermissionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in catalog.
    pub fn with_builtin() -> DomainResult<Self> {
        let mut registry = Self::new();
        catalog::register_builtin(&mut registry)?;
        Ok(registry)
    }

    /// Registers a permission.
    ///
    /// Registering the exact same permission again returns the existing
    /// entry, so namespace initialisation may run more than once. A
    /// different label for an existing (namespace, name) pair fails with
    /// [`DomainError::DuplicatePermission`]. The namespace label is fixed
    /// by the first registration in the namespace; a different label on a
    /// later call is ignored with a warning.
    pub fn register(
        &mut self,
        namespace_id: &str,
        namespace_label: &str,
        name: &str,
        label: &str,
    ) -> DomainResult<Permission> {
        validate_identifier(namespace_id)?;
        validate_identifier(name)?;

        let key = PermissionKey::new(namespace_id, name);
        if let Some(existing) = self.permissions.get(&key) {
            if existing.label != label {
                return Err(DomainError::DuplicatePermission {
                    namespace: namespace_id.to_string(),
                    name: name.to_string(),
                });
            }
            if existing.namespace_label != namespace_label {
                warn!(
                    namespace = namespace_id,
                    current = existing.namespace_label.as_str(),
                    ignored = namespace_label,
                    "namespace already registered with another label; keeping the first"
                );
            }
            return Ok(existing.clone());
        }

        let namespace_label = match self.namespaces.get(namespace_id) {
            Some(current) if current != namespace_label => {
                warn!(
                    namespace = namespace_id,
                    current = current.as_str(),
                    ignored = namespace_label,
                    "namespace already registered with another label; keeping the first"
                );
                current.clone()
            }
            Some(current) => current.clone(),
            None => {
                self.namespaces
                    .insert(namespace_id.to_string(), namespace_label.to_string());
                namespace_label.to_string()
            }
        };

        let permission = Permission {
            key: key.clone(),
            label: label.to_string(),
            namespace_label,
        };
        debug!(permission = %key, "registered permission");
        self.permissions.insert(key, permission.clone());
        Ok(permission)
    }

    /// Looks up a permission by namespace and name.
    pub fn lookup(&self, namespace_id: &str, name: &str) -> DomainResult<&Permission> {
        self.get(&PermissionKey::new(namespace_id, name))
    }

    /// Looks up a permission by key.
    pub fn get(&self, key: &PermissionKey) -> DomainResult<&Permission> {
        self.permissions
            .get(key)
            .ok_or_else(|| DomainError::UnknownPermission {
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            })
    }

    /// Parses "namespace.name" and looks the permission up.
    pub fn parse_and_lookup(&self, value: &str) -> DomainResult<&Permission> {
        self.get(&PermissionKey::parse(value)?)
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.permissions.contains_key(key)
    }

    /// Marks a registered permission as public (granted to anonymous
    /// principals).
    pub fn mark_public(&mut self, key: &PermissionKey) -> DomainResult<()> {
        self.get(key)?;
        self.public.insert(key.clone());
        Ok(())
    }

    pub fn is_public(&self, key: &PermissionKey) -> bool {
        self.public.contains(key)
    }

    /// Iterates over (namespace id, namespace label) pairs in id order.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(id, label)| (id.as_str(), label.as_str()))
    }

    /// Returns the permissions of a namespace in name order.
    pub fn permissions_in(&self, namespace_id: &str) -> Vec<&Permission> {
        self.permissions
            .values()
            .filter(|p| p.namespace() == namespace_id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.values()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

fn validate_identifier(value: &str) -> DomainResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidPermissionFormat {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PermissionRegistry::new();
        let permission = registry
            .register("ocr", "OCR", "ocr_document", "Submit documents for OCR")
            .unwrap();
        assert_eq!(permission.key.to_string(), "ocr.ocr_document");

        let found = registry.lookup("ocr", "ocr_document").unwrap();
        assert_eq!(found.label, "Submit documents for OCR");
        assert_eq!(found.namespace_label, "OCR");
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let mut registry = PermissionRegistry::new();
        let first = registry.register("ocr", "OCR", "ocr_document", "Submit").unwrap();
        let second = registry.register("ocr", "OCR", "ocr_document", "Submit").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_registration_is_duplicate() {
        let mut registry = PermissionRegistry::new();
        registry.register("ocr", "OCR", "ocr_document", "Submit").unwrap();
        let err = registry
            .register("ocr", "OCR", "ocr_document", "Something else")
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicatePermission { .. }));
    }

    #[test]
    fn test_lookup_unknown_permission() {
        let registry = PermissionRegistry::new();
        let err = registry.lookup("ocr", "missing").unwrap_err();
        assert!(matches!(err, DomainError::UnknownPermission { .. }));
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let mut registry = PermissionRegistry::new();
        assert!(registry.register("", "Empty", "x", "x").is_err());
        assert!(registry.register("ocr", "OCR", "a.b", "x").is_err());
    }

    #[test]
    fn test_namespace_label_is_fixed_by_first_registration() {
        let mut registry = PermissionRegistry::new();
        registry.register("ocr", "OCR", "a", "A").unwrap();
        let second = registry.register("ocr", "Renamed", "b", "B").unwrap();
        assert_eq!(second.namespace_label, "OCR");
        assert_eq!(registry.namespaces().collect::<Vec<_>>(), vec![("ocr", "OCR")]);
    }

    #[test]
    fn test_repeating_a_relabelled_registration_is_idempotent() {
        let mut registry = PermissionRegistry::new();
        registry.register("ocr", "OCR", "a", "A").unwrap();
        let first = registry.register("ocr", "Renamed", "b", "B").unwrap();
        let again = registry.register("ocr", "Renamed", "b", "B").unwrap();
        assert_eq!(first, again);
        assert_eq!(again.namespace_label, "OCR");
        assert_eq!(registry.len(), 2);

        // The label still has to match.
        let err = registry.register("ocr", "Renamed", "b", "Other").unwrap_err();
        assert!(matches!(err, DomainError::DuplicatePermission { .. }));
    }

    #[test]
    fn test_mark_public_requires_registration() {
        let mut registry = PermissionRegistry::new();
        let key = PermissionKey::new("ocr", "ocr_content_view");
        assert!(registry.mark_public(&key).is_err());

        registry
            .register("ocr", "OCR", "ocr_content_view", "View content")
            .unwrap();
        registry.mark_public(&key).unwrap();
        assert!(registry.is_public(&key));
    }

    #[test]
    fn test_permissions_in_namespace() {
        let mut registry = PermissionRegistry::new();
        registry.register("ocr", "OCR", "b", "B").unwrap();
        registry.register("ocr", "OCR", "a", "A").unwrap();
        registry.register("linking", "Smart links", "c", "C").unwrap();

        let names: Vec<&str> = registry.permissions_in("ocr").iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
