//! Resource resolver.
//!
//! Maps a requested object to the object an ACL check must actually be
//! evaluated against, following the owner edges selected by
//! [`rules::SCOPE_RULES`]. Resolution stops at the first object whose rule
//! says [`rules::Hop::Itself`].
//!
//! - **Existence**: every object on the path must be present in the
//!   snapshot; a missing object or owner fails with `ObjectNotFound`.
//! - **Termination**: a visited set and `max_hops` bound the walk even if
//!   owner edges form a cycle.

pub mod rules;

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{ObjectRef, PermissionKey};
use crate::traits::PolicySnapshot;

use rules::Hop;

/// Why an object could not be resolved to a check target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The object (or an owner on the path) does not exist.
    #[error("object not found: {object}")]
    ObjectNotFound { object: ObjectRef },

    /// The rules require an owner but the object has none.
    #[error("object {object} has no owner to resolve to")]
    MissingOwner { object: ObjectRef },

    /// The owner chain is longer than allowed or loops back on itself.
    #[error("owner chain from {object} exceeds {max_hops} hops")]
    HopLimitExceeded { object: ObjectRef, max_hops: u32 },
}

/// Resolves requested objects to check targets.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    max_hops: u32,
}

impl Default for ResourceResolver {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ResourceResolver {
    pub fn new(max_hops: u32) -> Self {
        Self { max_hops }
    }

    /// Returns the object that ACEs for `permission` must be looked up on.
    pub fn resolve_for_check(
        &self,
        snapshot: &dyn PolicySnapshot,
        object: &ObjectRef,
        permission: &PermissionKey,
    ) -> Result<ObjectRef, ResolveError> {
        let mut current = object.clone();
        let mut visited: HashSet<ObjectRef> = HashSet::new();
        let mut hops = 0u32;

        loop {
            if !snapshot.object_exists(&current) {
                return Err(ResolveError::ObjectNotFound { object: current });
            }

            match rules::hop_for(current.kind, permission) {
                Hop::Itself => return Ok(current),
                Hop::Owner => {
                    if hops >= self.max_hops || !visited.insert(current.clone()) {
                        return Err(ResolveError::HopLimitExceeded {
                            object: object.clone(),
                            max_hops: self.max_hops,
                        });
                    }
                    hops += 1;
                    current = snapshot
                        .owner_of(&current)
                        .ok_or_else(|| ResolveError::MissingOwner {
                            object: current.clone(),
                        })?;
                }
            }
        }
    }
}
