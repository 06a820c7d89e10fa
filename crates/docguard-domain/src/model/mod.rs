//! Identifier types for the authorization model.
//!
//! This module contains:
//! - Permission identifiers and registered permission metadata
//! - Subjects (users, groups, the anonymous principal)
//! - Object references into the document resource graph

mod object;
mod permission;
mod subject;
#[cfg(test)]
mod types_proptest;

pub use object::{ObjectKind, ObjectRef};
pub use permission::{Permission, PermissionKey};
pub use subject::Subject;
