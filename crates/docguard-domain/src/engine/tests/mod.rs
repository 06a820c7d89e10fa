//! Tests for the authorization engine.
//!
//! Organized by functionality:
//! - Global (role) grants
//! - Object grants (ACEs) and their revocation
//! - Resolver indirection (index nodes, document types, pages)
//! - Anonymous and public permissions
//! - Error propagation (unknown permissions, storage failures)
//! - Multi-permission checks and list filtering
