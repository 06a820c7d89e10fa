//! docguard-server: Access-control service for the document manager
//!
//! This crate wires the domain engine to a policy store and exposes what
//! request handlers need:
//! - Configuration loading and logging setup
//! - Storage → domain adapters
//! - The `AccessControl` service (checks, administration, list filtering)
//! - Endpoint permission maps and navigation link gating
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              docguard-server                 │
//! ├─────────────────────────────────────────────┤
//! │  config.rs     - Configuration management   │
//! │  logging.rs    - tracing-subscriber setup   │
//! │  adapters.rs   - PolicyStore → snapshots    │
//! │  service.rs    - AccessControl facade       │
//! │  errors.rs     - AccessError, status codes  │
//! │  endpoints.rs  - Per-endpoint permissions   │
//! │  navigation.rs - Permission-gated links     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod logging;
pub mod navigation;
pub mod service;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use errors::{AccessError, AccessResult};
pub use service::AccessControl;
