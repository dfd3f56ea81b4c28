//! Provider Descriptor Store
//!
//! Single source of truth for "how to build token T". The store only holds
//! descriptors; no instance construction happens here.
//!
//! Registration follows the value-wins anti-override invariant: once a value
//! descriptor is registered for a token, later *non-value* registrations for
//! the same token are silently ignored. This protects configured singletons
//! (a config object built by a factory module, say) from being clobbered by
//! a plain class registration discovered later in the import graph. A new
//! value registration always overwrites, including another value
//! registration - the last value registered wins.

use std::collections::HashMap;
use std::sync::RwLock;

use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::Token;
use tracing::debug;

/// What `register` did with a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Descriptor inserted or overwritten
    Registered,
    /// A value descriptor already holds the token; non-value registration
    /// was a no-op
    IgnoredValueWins,
}

/// Token -> descriptor registry
#[derive(Default)]
pub struct ProviderStore {
    providers: RwLock<HashMap<Token, ProviderDescriptor>>,
}

impl ProviderStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update the descriptor for its token
    pub fn register(&self, descriptor: ProviderDescriptor) -> StoreOutcome {
        let mut providers = self.providers.write().expect("provider store poisoned");
        if let Some(existing) = providers.get(&descriptor.token) {
            if existing.kind.is_value() && !descriptor.kind.is_value() {
                debug!(
                    token = %descriptor.token,
                    kind = descriptor.kind.kind_name(),
                    "value provider already registered; ignoring non-value registration"
                );
                return StoreOutcome::IgnoredValueWins;
            }
        }
        debug!(
            token = %descriptor.token,
            kind = descriptor.kind.kind_name(),
            scope = %descriptor.scope,
            "registered provider"
        );
        providers.insert(descriptor.token.clone(), descriptor);
        StoreOutcome::Registered
    }

    /// Descriptor for a token, if registered
    pub fn get(&self, token: &Token) -> Option<ProviderDescriptor> {
        self.providers
            .read()
            .expect("provider store poisoned")
            .get(token)
            .cloned()
    }

    /// Whether a descriptor exists for the token
    pub fn contains(&self, token: &Token) -> bool {
        self.providers
            .read()
            .expect("provider store poisoned")
            .contains_key(token)
    }

    /// Number of registered descriptors
    pub fn len(&self) -> usize {
        self.providers.read().expect("provider store poisoned").len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered tokens (diagnostics)
    pub fn tokens(&self) -> Vec<Token> {
        self.providers
            .read()
            .expect("provider store poisoned")
            .keys()
            .cloned()
            .collect()
    }
}
