//! docguard-storage: Policy storage abstraction layer
//!
//! This crate provides the storage abstraction for docguard, including:
//! - PolicyStore trait for administrative mutations and snapshots
//! - PolicyTables, the materialized policy state a snapshot exposes
//! - In-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              docguard-storage                │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs - PolicyStore trait, records     │
//! │  tables.rs - Snapshot state and indexes     │
//! │  memory.rs - In-memory implementation       │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod tables;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryPolicyStore;
pub use tables::PolicyTables;
pub use traits::{AceFilter, ObjectKey, PolicyStore, StoredAce, StoredObject, StoredRole};
