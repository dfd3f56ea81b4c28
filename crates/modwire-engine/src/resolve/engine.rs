//! Synchronous resolution path
//!
//! Runs to completion without suspension. A token observed mid-construction
//! on a *different* logical task cannot be awaited here and surfaces as a
//! concurrent-resolution error; the async path waits instead.

use modwire_domain::error::{Error, Result};
use modwire_domain::instance::{AnyInstance, Injected};
use modwire_domain::provider::{FactoryKind, ProviderDescriptor, ProviderKind, ProviderScope};
use modwire_domain::token::{Token, TokenRef};

use crate::cache::{CacheEntry, InstanceCache};
use crate::container::ContainerCore;
use crate::resolve::ResolveCtx;

impl ContainerCore {
    /// Entry point for one synchronous resolution call
    pub(crate) fn resolve_sync(
        &self,
        token_ref: &TokenRef,
        request: Option<String>,
    ) -> Result<AnyInstance> {
        let request = request.or_else(|| self.current_request_id());
        let mut ctx = ResolveCtx::new(request);
        self.resolve_ref_sync(token_ref, &mut ctx)
    }

    /// Eager resolution on behalf of a lazy stand-in
    pub(crate) fn resolve_eager_sync(
        &self,
        token: &Token,
        request: Option<String>,
    ) -> Result<AnyInstance> {
        let mut ctx = ResolveCtx::new(request);
        ctx.eager = Some(token.clone());
        self.resolve_token_sync(token.clone(), &mut ctx)
    }

    pub(crate) fn resolve_ref_sync(
        &self,
        token_ref: &TokenRef,
        ctx: &mut ResolveCtx,
    ) -> Result<AnyInstance> {
        let token = token_ref.resolve()?;
        self.resolve_token_sync(token, ctx)
    }

    fn resolve_token_sync(&self, token: Token, ctx: &mut ResolveCtx) -> Result<AnyInstance> {
        let descriptor = self.descriptor_for(&token)?;
        self.check_condition(&token, &descriptor)?;

        if descriptor.lazy && !ctx.take_eager(&token) {
            return self.lazy_stand_in(&token, &descriptor, ctx);
        }

        match descriptor.scope {
            ProviderScope::Singleton => {
                let singletons = self.singletons();
                self.resolve_cached_sync(&singletons, &descriptor, token, ctx)
            }
            ProviderScope::Request => match self.request_cache(ctx) {
                Some(cache) => self.resolve_cached_sync(&cache, &descriptor, token, ctx),
                None => {
                    self.warn_scope_fallback(&token);
                    self.construct_sync(&descriptor, token, ctx, None)
                }
            },
            ProviderScope::Transient => {
                if ctx.in_path(&token) {
                    return Err(Error::circular_dependency(&ctx.path, &token));
                }
                self.construct_sync(&descriptor, token, ctx, None)
            }
        }
    }

    fn resolve_cached_sync(
        &self,
        cache: &InstanceCache,
        descriptor: &ProviderDescriptor,
        token: Token,
        ctx: &mut ResolveCtx,
    ) -> Result<AnyInstance> {
        match cache.get(&token) {
            Some(CacheEntry::Ready(instance)) => Ok(instance),
            Some(CacheEntry::Pending(placeholder)) => {
                if ctx.in_path(&token) {
                    // Recoverable circular dependency: the placeholder was
                    // inserted before this token's dependencies started
                    // resolving, so re-entry hands back its identity.
                    self.warn_cycle_recovered(&ctx.path, &token);
                    let stand_in: AnyInstance = placeholder;
                    Ok(stand_in)
                } else {
                    Err(Error::concurrent_resolution(&token))
                }
            }
            Some(CacheEntry::InFlight) => {
                if ctx.in_path(&token) {
                    // Factory cycle: no placeholder semantics, first entry
                    // is the only entry.
                    Err(Error::circular_dependency(&ctx.path, &token))
                } else {
                    Err(Error::concurrent_resolution(&token))
                }
            }
            None => {
                if ctx.in_path(&token) {
                    Err(Error::circular_dependency(&ctx.path, &token))
                } else {
                    self.construct_sync(descriptor, token, ctx, Some(cache))
                }
            }
        }
    }

    fn construct_sync(
        &self,
        descriptor: &ProviderDescriptor,
        token: Token,
        ctx: &mut ResolveCtx,
        cache: Option<&InstanceCache>,
    ) -> Result<AnyInstance> {
        if let ProviderKind::Value(value) = &descriptor.kind {
            return Ok(value.clone());
        }

        if let Some(cache) = cache {
            match &descriptor.kind {
                ProviderKind::Class(_) => {
                    cache.insert_pending(&token);
                }
                ProviderKind::Factory { .. } => cache.mark_in_flight(&token),
                ProviderKind::Value(_) => {}
            }
        }

        ctx.path.push(token.clone());
        let produced = match &descriptor.kind {
            ProviderKind::Factory { factory, deps } => {
                self.resolve_args_sync(deps, ctx).and_then(|args| match factory {
                    FactoryKind::Sync(factory) => {
                        factory(&args).map_err(|error| Error::construction(&token, error))
                    }
                    FactoryKind::Async(_) => Err(Error::sync_resolve_unsupported(&token)),
                })
            }
            ProviderKind::Class(spec) => self.resolve_args_sync(&spec.deps, ctx).and_then(|args| {
                (spec.ctor)(&args).map_err(|error| Error::construction(&token, error))
            }),
            ProviderKind::Value(value) => Ok(value.clone()),
        };
        ctx.path.pop();

        self.finish_construction(&token, descriptor.scope, produced, cache)
    }

    fn resolve_args_sync(&self, deps: &[TokenRef], ctx: &mut ResolveCtx) -> Result<Vec<Injected>> {
        deps.iter()
            .map(|dep| {
                self.resolve_ref_sync(dep, ctx)
                    .map(Injected::from_instance)
            })
            .collect()
    }
}
