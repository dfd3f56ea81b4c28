//! Resolution Engine
//!
//! Produces an instance for a token, honoring scope and handling cycles.
//! The synchronous and asynchronous variants behave identically with respect
//! to caching and cycle semantics; the asynchronous variant additionally
//! awaits independent dependency subtrees in parallel and can wait for a
//! token mid-construction on another logical task.
//!
//! Cycle detection state lives in a per-call [`ResolveCtx`], never on the
//! container, so it cannot leak across calls: the resolving path is empty by
//! construction once a resolution returns, whether it succeeded or failed.

mod async_engine;
mod engine;
mod lazy;

pub use lazy::LazyRef;

use modwire_domain::error::Result;
use modwire_domain::events::LifecycleEventKind;
use modwire_domain::instance::AnyInstance;
use modwire_domain::provider::{ProviderDescriptor, ProviderScope};
use modwire_domain::token::Token;
use std::sync::Arc;

use crate::cache::InstanceCache;
use crate::container::ContainerCore;

/// Per-call resolution state
///
/// `path` is the ordered chain of tokens mid-construction on this call
/// stack; `eager` suppresses the lazy flag for exactly one token (used by
/// lazy stand-ins to reach the real provider).
#[derive(Clone, Debug)]
pub(crate) struct ResolveCtx {
    pub(crate) path: Vec<Token>,
    pub(crate) request_id: Option<String>,
    pub(crate) eager: Option<Token>,
}

impl ResolveCtx {
    pub(crate) fn new(request_id: Option<String>) -> Self {
        Self {
            path: Vec::new(),
            request_id,
            eager: None,
        }
    }

    pub(crate) fn in_path(&self, token: &Token) -> bool {
        self.path.contains(token)
    }

    /// Consume the one-shot eager override for this token
    pub(crate) fn take_eager(&mut self, token: &Token) -> bool {
        if self.eager.as_ref() == Some(token) {
            self.eager = None;
            true
        } else {
            false
        }
    }

    /// Context for a dependency subtree: same request, path extended with
    /// the token under construction
    pub(crate) fn child_with(&self, token: Token) -> Self {
        let mut path = self.path.clone();
        path.push(token);
        Self {
            path,
            request_id: self.request_id.clone(),
            eager: None,
        }
    }
}

// Construction steps shared by the sync and async engines.
impl ContainerCore {
    /// Record the outcome of a factory/constructor invocation
    ///
    /// On success the scope cache entry becomes ready (filling a pending
    /// placeholder so every holder of the earlier reference observes the
    /// instance) and an instance-created event is emitted. On failure the
    /// pending/in-flight marker is dropped so no mid-construction state
    /// survives the error. Waiters are notified either way.
    pub(crate) fn finish_construction(
        &self,
        token: &Token,
        scope: ProviderScope,
        produced: Result<AnyInstance>,
        cache: Option<&InstanceCache>,
    ) -> Result<AnyInstance> {
        match produced {
            Ok(instance) => {
                if let Some(cache) = cache {
                    cache.complete(token, instance.clone());
                }
                self.notify_completion(token);
                self.events().emit(LifecycleEventKind::InstanceCreated {
                    token: token.name().to_string(),
                    scope,
                });
                Ok(instance)
            }
            Err(error) => {
                if let Some(cache) = cache {
                    cache.abort(token);
                }
                self.notify_completion(token);
                Err(error)
            }
        }
    }

    /// Produce the lazy stand-in for a provider
    ///
    /// Singleton stand-ins are cached on the container (one stand-in per
    /// token) in a map separate from the instance cache, so the eager
    /// resolution triggered by the stand-in's first access stores the real
    /// instance without colliding with it. Request and transient stand-ins
    /// are built fresh; target identity per scope is preserved by the
    /// eager resolution itself.
    pub(crate) fn lazy_stand_in(
        &self,
        token: &Token,
        descriptor: &ProviderDescriptor,
        ctx: &ResolveCtx,
    ) -> Result<AnyInstance> {
        let request_id = match descriptor.scope {
            ProviderScope::Singleton => None,
            _ => ctx.request_id.clone(),
        };
        let make = || -> AnyInstance {
            Arc::new(LazyRef::new(self.weak_self(), token.clone(), request_id))
        };
        match descriptor.scope {
            ProviderScope::Singleton => Ok(self.singleton_stand_in(token, make)),
            ProviderScope::Request | ProviderScope::Transient => Ok(make()),
        }
    }
}
