//! Subject → group → role traversal.
//!
//! Group membership may contain cycles (a group nested in itself through
//! other groups). Every traversal keeps a visited set, so it terminates
//! after touching each principal once and never counts a role twice.
//! Nesting deeper than the configured depth is an error, never a silent
//! cut-off.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::warn;

use crate::error::{DomainError, DomainResult};
use crate::model::{PermissionKey, Subject};
use crate::traits::PolicySnapshot;

/// Membership queries over a policy snapshot.
pub struct Membership<'a> {
    snapshot: &'a dyn PolicySnapshot,
    max_depth: u32,
}

impl<'a> Membership<'a> {
    pub fn new(snapshot: &'a dyn PolicySnapshot, max_depth: u32) -> Self {
        Self {
            snapshot,
            max_depth,
        }
    }

    /// The subject itself plus every group it belongs to, transitively.
    ///
    /// Breadth-first, so the nearest groups come first. Fails with
    /// [`DomainError::DepthLimitExceeded`] when an unvisited group sits
    /// more than `max_depth` nesting levels away. Cycles back to groups
    /// already seen do not count. The anonymous principal has no
    /// memberships.
    pub fn principals_of(&self, subject: &Subject) -> DomainResult<Vec<Subject>> {
        if subject.is_anonymous() {
            return Ok(Vec::new());
        }

        let mut visited: HashSet<Subject> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([(subject.clone(), 0u32)]);
        visited.insert(subject.clone());

        while let Some((principal, depth)) = queue.pop_front() {
            let groups = self.snapshot.direct_groups(&principal);
            order.push(principal);
            for group in groups {
                let group = Subject::Group(group);
                if visited.contains(&group) {
                    continue;
                }
                if depth >= self.max_depth {
                    warn!(
                        subject = %subject,
                        max_depth = self.max_depth,
                        "group nesting exceeds depth limit"
                    );
                    return Err(DomainError::DepthLimitExceeded {
                        max_depth: self.max_depth,
                    });
                }
                visited.insert(group.clone());
                queue.push_back((group, depth + 1));
            }
        }

        Ok(order)
    }

    /// Every role reachable from the subject.
    pub fn roles_of(&self, subject: &Subject) -> DomainResult<BTreeSet<String>> {
        Ok(self
            .principals_of(subject)?
            .iter()
            .flat_map(|principal| self.snapshot.direct_roles(principal))
            .collect())
    }

    /// Union of the global permissions of every reachable role.
    pub fn permissions_of(&self, subject: &Subject) -> DomainResult<BTreeSet<PermissionKey>> {
        Ok(self
            .roles_of(subject)?
            .iter()
            .flat_map(|role| self.snapshot.role_permissions(role))
            .collect())
    }

    /// Whether any reachable role grants `permission` globally.
    pub fn has_permission(&self, subject: &Subject, permission: &PermissionKey) -> DomainResult<bool> {
        Ok(self.roles_of(subject)?.iter().any(|role| {
            self.snapshot
                .role_permissions(role)
                .iter()
                .any(|granted| granted == permission)
        }))
    }

    /// Whether the subject is a (possibly transitive) member of `role`.
    pub fn is_member(&self, subject: &Subject, role: &str) -> DomainResult<bool> {
        Ok(self.roles_of(subject)?.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::mocks::MockSnapshot;

    fn view() -> PermissionKey {
        PermissionKey::new("documents", "document_view")
    }

    #[test]
    fn test_direct_role_grants_permission() {
        let mut snapshot = MockSnapshot::default();
        snapshot.grant("viewers", view());
        snapshot.add_role_member("viewers", Subject::user("alice"));

        let membership = Membership::new(&snapshot, 25);
        assert!(membership.has_permission(&Subject::user("alice"), &view()).unwrap());
        assert!(!membership.has_permission(&Subject::user("bob"), &view()).unwrap());
    }

    #[test]
    fn test_roles_are_inherited_through_nested_groups() {
        let mut snapshot = MockSnapshot::default();
        snapshot.grant("viewers", view());
        snapshot.add_role_member("viewers", Subject::group("company"));
        snapshot.add_group_member("company", Subject::group("engineering"));
        snapshot.add_group_member("engineering", Subject::user("alice"));

        let membership = Membership::new(&snapshot, 25);
        let alice = Subject::user("alice");
        assert!(membership.is_member(&alice, "viewers").unwrap());
        assert_eq!(
            membership.permissions_of(&alice).unwrap().into_iter().collect::<Vec<_>>(),
            vec![view()]
        );
    }

    #[test]
    fn test_cyclic_groups_terminate_without_duplicates() {
        let mut snapshot = MockSnapshot::default();
        snapshot.grant("viewers", view());
        snapshot.add_role_member("viewers", Subject::group("a"));
        snapshot.add_role_member("viewers", Subject::group("b"));
        snapshot.add_group_member("a", Subject::group("b"));
        snapshot.add_group_member("b", Subject::group("a"));
        snapshot.add_group_member("a", Subject::user("alice"));

        let membership = Membership::new(&snapshot, 25);
        let alice = Subject::user("alice");
        let principals = membership.principals_of(&alice).unwrap();
        assert_eq!(principals.len(), 3);
        assert_eq!(membership.roles_of(&alice).unwrap().len(), 1);
        assert_eq!(membership.permissions_of(&alice).unwrap().len(), 1);
    }

    #[test]
    fn test_cycles_do_not_count_against_depth_limit() {
        let mut snapshot = MockSnapshot::default();
        snapshot.add_role_member("viewers", Subject::group("a"));
        snapshot.add_group_member("a", Subject::user("alice"));
        snapshot.add_group_member("a", Subject::group("a"));

        let membership = Membership::new(&snapshot, 1);
        assert!(membership.is_member(&Subject::user("alice"), "viewers").unwrap());
    }

    #[test]
    fn test_depth_limit_is_an_error() {
        let mut snapshot = MockSnapshot::default();
        snapshot.add_role_member("deep", Subject::group("g2"));
        snapshot.add_group_member("g1", Subject::user("alice"));
        snapshot.add_group_member("g2", Subject::group("g1"));

        let alice = Subject::user("alice");
        assert!(Membership::new(&snapshot, 2).is_member(&alice, "deep").unwrap());
        assert!(matches!(
            Membership::new(&snapshot, 1).is_member(&alice, "deep"),
            Err(DomainError::DepthLimitExceeded { max_depth: 1 })
        ));
    }

    #[test]
    fn test_long_nesting_chain_is_never_a_silent_deny() {
        // g0 holds alice, g(i+1) holds g(i); the role sits on the outermost group.
        let mut snapshot = MockSnapshot::default();
        snapshot.grant("viewers", view());
        snapshot.add_group_member("g0", Subject::user("alice"));
        for i in 0..30 {
            snapshot.add_group_member(&format!("g{}", i + 1), Subject::group(format!("g{i}")));
        }
        snapshot.add_role_member("viewers", Subject::group("g30"));

        let alice = Subject::user("alice");
        assert!(matches!(
            Membership::new(&snapshot, 25).has_permission(&alice, &view()),
            Err(DomainError::DepthLimitExceeded { max_depth: 25 })
        ));
        assert!(Membership::new(&snapshot, 31).has_permission(&alice, &view()).unwrap());
    }

    proptest::proptest! {
        // Arbitrary (often cyclic) nesting among six groups: the traversal
        // must terminate and agree with a naive reachability closure.
        #[test]
        fn test_traversal_matches_reachability(
            edges in proptest::collection::vec((0usize..6, 0usize..6), 0..20),
            role_group in 0usize..6,
        ) {
            let mut snapshot = MockSnapshot::default();
            snapshot.add_group_member("g0", Subject::user("alice"));
            for (parent, child) in &edges {
                snapshot.add_group_member(&format!("g{parent}"), Subject::group(format!("g{child}")));
            }
            snapshot.add_role_member("r", Subject::group(format!("g{role_group}")));

            let mut reachable = BTreeSet::from([0usize]);
            loop {
                let next: BTreeSet<usize> = edges
                    .iter()
                    .filter(|(_, child)| reachable.contains(child))
                    .map(|(parent, _)| *parent)
                    .collect();
                if next.is_subset(&reachable) {
                    break;
                }
                reachable.extend(next);
            }

            let membership = Membership::new(&snapshot, 25);
            let alice = Subject::user("alice");
            let principals = membership.principals_of(&alice).unwrap();
            let unique: HashSet<&Subject> = principals.iter().collect();
            proptest::prop_assert_eq!(unique.len(), principals.len());
            proptest::prop_assert_eq!(principals.len(), reachable.len() + 1);
            proptest::prop_assert_eq!(
                membership.is_member(&alice, "r").unwrap(),
                reachable.contains(&role_group)
            );
        }
    }

    #[test]
    fn test_anonymous_has_no_roles() {
        let mut snapshot = MockSnapshot::default();
        snapshot.add_role_member("everyone", Subject::Anonymous);
        let membership = Membership::new(&snapshot, 25);
        assert!(membership.roles_of(&Subject::Anonymous).unwrap().is_empty());
    }
}
