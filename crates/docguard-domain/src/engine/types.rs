//! Types for authorization decisions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// How an allowed check was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    /// The permission is public and allowed for every subject.
    Public,
    /// A role of the subject holds the permission globally.
    GlobalGrant,
    /// An access control entry on the resolved target.
    ObjectGrant,
}

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No usable identity.
    Unauthorized,
    /// The target, or the object it resolves through, is missing.
    ObjectNotFound,
    /// Authenticated but neither a global nor an object grant applies.
    PermissionDenied,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unauthorized => "unauthorized",
            Self::ObjectNotFound => "object not found",
            Self::PermissionDenied => "permission denied",
        };
        f.write_str(text)
    }
}

/// Result of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum Decision {
    Allow(AllowReason),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Allow(_) => None,
            Self::Deny(reason) => Some(*reason),
        }
    }
}

/// Decision counters for monitoring.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub allowed: AtomicU64,
    pub denied: AtomicU64,
    /// Checks that failed with an error instead of a decision.
    pub errors: AtomicU64,
}

impl EngineMetrics {
    pub(crate) fn record(&self, decision: &Decision) {
        let counter = if decision.is_allowed() {
            &self.allowed
        } else {
            &self.denied
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of the current counters.
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of engine metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMetricsSnapshot {
    pub allowed: u64,
    pub denied: u64,
    pub errors: u64,
}
