//! Per-session permission grant/deny cache (§4.5, §9 "Permission cache").
//!
//! Scoped to one session's lifetime; does not persist across resumes — a
//! conservative default so a resumed session re-prompts rather than
//! silently reusing a stale grant.

use std::collections::HashSet;

/// Caches `Ask`-resolved decisions for the lifetime of one session.
#[derive(Debug, Default)]
pub struct PermissionCache {
    allowed: HashSet<String>,
    denied: HashSet<String>,
}

impl PermissionCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached decision for `tool_id`, if one was already recorded this
    /// session.
    pub fn cached(&self, tool_id: &str) -> Option<bool> {
        if self.allowed.contains(tool_id) {
            Some(true)
        } else if self.denied.contains(tool_id) {
            Some(false)
        } else {
            None
        }
    }

    /// Record that `tool_id` was allowed.
    pub fn allow(&mut self, tool_id: impl Into<String>) {
        self.allowed.insert(tool_id.into());
    }

    /// Record that `tool_id` was denied.
    pub fn deny(&mut self, tool_id: impl Into<String>) {
        self.denied.insert(tool_id.into());
    }
}
