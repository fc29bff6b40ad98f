use std::sync::Arc;

use dashmap::DashMap;

/// Thread-safe in-memory cache mapping short code -> long URL.
///
/// Backed by a DashMap so concurrent redirects rarely contend. The cache is
/// warmed from the database at startup, written through on every create, and
/// backfilled on a lookup miss. Links are never updated after creation, so a
/// cached entry can never go stale.
#[derive(Clone, Debug, Default)]
pub struct LinkCache {
    inner: Arc<DashMap<String, String>>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, code: impl Into<String>, long_url: impl Into<String>) {
        self.inner.insert(code.into(), long_url.into());
    }

    /// Look up a short code. Returns a clone of the long URL if present.
    pub fn get(&self, code: &str) -> Option<String> {
        self.inner.get(code).map(|v| v.clone())
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
