//! Per-scope instance caches
//!
//! Both the container-wide singleton cache and each per-request cache are an
//! [`InstanceCache`]: a concurrent map from token to cache entry. An entry is
//! either a finished instance, a placeholder for a class provider whose
//! dependencies are still resolving (the recoverable-cycle case), or a bare
//! in-flight marker for a factory under construction (factories have no
//! placeholder semantics; re-entering one is always an error).

use dashmap::DashMap;
use modwire_domain::instance::{AnyInstance, Placeholder};
use modwire_domain::token::Token;
use std::sync::Arc;

/// State of a token within one cache
#[derive(Clone)]
pub(crate) enum CacheEntry {
    /// Fully constructed instance
    Ready(AnyInstance),
    /// Class provider mid-construction; re-entrant resolution on the same
    /// path receives this placeholder
    Pending(Arc<Placeholder>),
    /// Factory provider mid-construction; re-entry is never recoverable
    InFlight,
}

/// Token -> entry map backing one scope
#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: DashMap<Token, CacheEntry>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current entry for a token, if any
    pub(crate) fn get(&self, token: &Token) -> Option<CacheEntry> {
        self.entries.get(token).map(|entry| entry.clone())
    }

    /// Insert a placeholder before a class provider's dependencies resolve
    pub(crate) fn insert_pending(&self, token: &Token) -> Arc<Placeholder> {
        let placeholder = Placeholder::new(token.clone());
        self.entries
            .insert(token.clone(), CacheEntry::Pending(placeholder.clone()));
        placeholder
    }

    /// Mark a factory token as under construction
    pub(crate) fn mark_in_flight(&self, token: &Token) {
        self.entries.insert(token.clone(), CacheEntry::InFlight);
    }

    /// Record a finished construction
    ///
    /// Fills the pending placeholder, if one exists, so every holder of the
    /// earlier reference observes the instance, then swaps the entry to
    /// `Ready`.
    pub(crate) fn complete(&self, token: &Token, instance: AnyInstance) {
        match self.entries.get_mut(token) {
            Some(mut entry) => {
                if let CacheEntry::Pending(placeholder) = &*entry {
                    placeholder.fill(instance.clone());
                }
                *entry = CacheEntry::Ready(instance);
            }
            None => {
                self.entries
                    .insert(token.clone(), CacheEntry::Ready(instance));
            }
        }
    }

    /// Drop a pending/in-flight marker after a failed construction
    pub(crate) fn abort(&self, token: &Token) {
        self.entries.remove(token);
    }

    /// Number of cached tokens (diagnostics)
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
