//! docguard-domain: Core authorization domain logic
//!
//! This crate contains the access-control core of the document manager:
//! - Permission registry and the built-in permission catalog
//! - Subject / object / permission identifiers
//! - Role membership traversal (cycle-safe)
//! - Access control entry evaluation
//! - Resource resolution (node → index, document → type, page → document)
//! - The authorization engine combining all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               docguard-domain                │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Identifiers and permissions  │
//! │  registry/   - Permission registry/catalog  │
//! │  membership  - Subject → role traversal     │
//! │  acl         - Object-scoped grants         │
//! │  resolver/   - Check target resolution      │
//! │  engine/     - Authorization decisions      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod acl;
pub mod engine;
pub mod error;
pub mod membership;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod traits;

// Re-export commonly used types at the crate root
pub use engine::{AuthorizationEngine, Decision, DenyReason, EngineConfig};
pub use error::{DomainError, DomainResult};
pub use model::{ObjectKind, ObjectRef, Permission, PermissionKey, Subject};
pub use registry::PermissionRegistry;
pub use traits::{PolicyReader, PolicySnapshot};
