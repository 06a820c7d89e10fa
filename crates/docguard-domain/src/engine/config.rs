//! Configuration for the authorization engine.

/// Configuration for the authorization engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum group nesting followed when collecting a subject's roles.
    pub max_membership_depth: u32,
    /// Maximum owner edges followed when resolving a check target.
    pub max_resolution_hops: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_membership_depth: 25,
            max_resolution_hops: 8,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with the specified membership depth.
    pub fn with_max_membership_depth(mut self, max_membership_depth: u32) -> Self {
        self.max_membership_depth = max_membership_depth;
        self
    }

    /// Creates a new configuration with the specified resolution hop limit.
    pub fn with_max_resolution_hops(mut self, max_resolution_hops: u32) -> Self {
        self.max_resolution_hops = max_resolution_hops;
        self
    }
}
