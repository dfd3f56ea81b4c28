//! Scope Manager - per-request sub-containers
//!
//! Owns one [`InstanceCache`] per in-flight request id. Caches are created
//! when an id is first seen and discarded on request completion; cleanup
//! hooks on cached instances are the caller's responsibility and are not
//! invoked here. Distinct request ids are fully isolated: a request-scoped
//! token resolved under id A never returns an instance created under id B.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::InstanceCache;

/// Request id -> per-request cache
#[derive(Default)]
pub struct ScopeManager {
    scopes: DashMap<String, Arc<InstanceCache>>,
}

impl ScopeManager {
    /// Empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for an id, if the request is active
    pub(crate) fn get(&self, request_id: &str) -> Option<Arc<InstanceCache>> {
        self.scopes.get(request_id).map(|cache| cache.clone())
    }

    /// Cache for an id, creating it on first sight
    ///
    /// Returns the cache and whether this call created it.
    pub(crate) fn ensure(&self, request_id: &str) -> (Arc<InstanceCache>, bool) {
        if let Some(existing) = self.get(request_id) {
            return (existing, false);
        }
        let mut created = false;
        let cache = self
            .scopes
            .entry(request_id.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(InstanceCache::new())
            })
            .clone();
        (cache, created)
    }

    /// Discard the cache for an id; returns whether one existed
    pub(crate) fn remove(&self, request_id: &str) -> bool {
        self.scopes.remove(request_id).is_some()
    }

    /// Number of active request scopes
    pub fn active_requests(&self) -> usize {
        self.scopes.len()
    }
}
