//! Check-target rules for the resource resolver.
//!
//! The table is keyed by (object kind, permission selector). When several
//! rules match, the most specific selector wins: an exact permission beats
//! a namespace, which beats `Any`. A pair no rule matches is checked
//! against the object itself.

use crate::model::{ObjectKind, PermissionKey};
use crate::registry::catalog::{
    self, BuiltinPermission, DOCUMENT_INDEXING, LINKING,
};

/// Which permissions a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSelector {
    Exact(BuiltinPermission),
    Namespace(&'static str),
    Any,
}

impl PermissionSelector {
    pub fn matches(&self, permission: &PermissionKey) -> bool {
        match self {
            Self::Exact(exact) => {
                permission.namespace == exact.namespace && permission.name == exact.name
            }
            Self::Namespace(namespace) => permission.in_namespace(namespace),
            Self::Any => true,
        }
    }

    fn specificity(&self) -> u8 {
        match self {
            Self::Exact(_) => 2,
            Self::Namespace(_) => 1,
            Self::Any => 0,
        }
    }
}

/// Where a check on an object is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    /// On the object itself.
    Itself,
    /// On the object's owner; resolution continues from there.
    Owner,
}

/// One row of the resolution table.
#[derive(Debug, Clone, Copy)]
pub struct ScopeRule {
    pub kind: ObjectKind,
    pub selector: PermissionSelector,
    pub hop: Hop,
}

const fn rule(kind: ObjectKind, selector: PermissionSelector, hop: Hop) -> ScopeRule {
    ScopeRule {
        kind,
        selector,
        hop,
    }
}

pub const SCOPE_RULES: &[ScopeRule] = &[
    rule(
        ObjectKind::IndexInstanceNode,
        PermissionSelector::Namespace(DOCUMENT_INDEXING),
        Hop::Owner,
    ),
    rule(
        ObjectKind::IndexTemplateNode,
        PermissionSelector::Namespace(DOCUMENT_INDEXING),
        Hop::Owner,
    ),
    rule(
        ObjectKind::Document,
        PermissionSelector::Exact(catalog::DOCUMENT_TYPE_VIEW),
        Hop::Owner,
    ),
    rule(
        ObjectKind::Document,
        PermissionSelector::Exact(catalog::DOCUMENT_TYPE_EDIT),
        Hop::Owner,
    ),
    rule(
        ObjectKind::Document,
        PermissionSelector::Exact(catalog::DOCUMENT_TYPE_DELETE),
        Hop::Owner,
    ),
    rule(
        ObjectKind::Document,
        PermissionSelector::Exact(catalog::OCR_DOCUMENT_TYPE_SETUP),
        Hop::Owner,
    ),
    rule(ObjectKind::DocumentVersion, PermissionSelector::Any, Hop::Owner),
    rule(ObjectKind::DocumentPage, PermissionSelector::Any, Hop::Owner),
    rule(
        ObjectKind::SmartLinkCondition,
        PermissionSelector::Namespace(LINKING),
        Hop::Owner,
    ),
    rule(ObjectKind::OcrEntry, PermissionSelector::Any, Hop::Owner),
];

/// Looks up the hop for an object kind and permission.
pub fn hop_for(kind: ObjectKind, permission: &PermissionKey) -> Hop {
    SCOPE_RULES
        .iter()
        .filter(|rule| rule.kind == kind && rule.selector.matches(permission))
        .max_by_key(|rule| rule.selector.specificity())
        .map_or(Hop::Itself, |rule| rule.hop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::catalog::*;

    #[test]
    fn test_index_nodes_defer_indexing_permissions_to_owner() {
        assert_eq!(
            hop_for(ObjectKind::IndexInstanceNode, &DOCUMENT_INDEXING_VIEW.key()),
            Hop::Owner
        );
        assert_eq!(
            hop_for(ObjectKind::IndexTemplateNode, &DOCUMENT_INDEXING_EDIT.key()),
            Hop::Owner
        );
    }

    #[test]
    fn test_document_type_permissions_on_documents_go_to_owner() {
        assert_eq!(hop_for(ObjectKind::Document, &DOCUMENT_TYPE_VIEW.key()), Hop::Owner);
        assert_eq!(
            hop_for(ObjectKind::Document, &OCR_DOCUMENT_TYPE_SETUP.key()),
            Hop::Owner
        );
        assert_eq!(hop_for(ObjectKind::Document, &DOCUMENT_VIEW.key()), Hop::Itself);
        assert_eq!(hop_for(ObjectKind::Document, &DOCUMENT_EDIT.key()), Hop::Itself);
    }

    #[test]
    fn test_unmatched_pairs_check_the_object_itself() {
        assert_eq!(hop_for(ObjectKind::Index, &DOCUMENT_INDEXING_VIEW.key()), Hop::Itself);
        assert_eq!(hop_for(ObjectKind::SmartLink, &SMART_LINK_VIEW.key()), Hop::Itself);
        assert_eq!(
            hop_for(ObjectKind::IndexInstanceNode, &DOCUMENT_VIEW.key()),
            Hop::Itself
        );
    }

    #[test]
    fn test_every_rule_kind_is_distinct_per_selector() {
        for (i, a) in SCOPE_RULES.iter().enumerate() {
            for b in &SCOPE_RULES[i + 1..] {
                assert!(
                    !(a.kind == b.kind && a.selector == b.selector),
                    "duplicate rule for {}",
                    a.kind
                );
            }
        }
    }
}
