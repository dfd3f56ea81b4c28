//! Asynchronous resolution path
//!
//! Identical caching and cycle semantics to the synchronous path, with two
//! additions: independent dependency subtrees of one provider resolve in
//! parallel (declared argument order is preserved), and a token observed
//! mid-construction on another logical task is awaited instead of failing.
//! Suspension happens only at dependency and factory boundaries - a single
//! instance is never half-built across an await point.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use modwire_domain::error::{Error, Result};
use modwire_domain::instance::{AnyInstance, Injected};
use modwire_domain::provider::{FactoryKind, ProviderDescriptor, ProviderKind, ProviderScope};
use modwire_domain::token::{Token, TokenRef};

use crate::cache::{CacheEntry, InstanceCache};
use crate::container::ContainerCore;
use crate::resolve::ResolveCtx;

impl ContainerCore {
    /// Entry point for one asynchronous resolution call
    pub(crate) async fn resolve_async_entry(
        self: Arc<Self>,
        token_ref: TokenRef,
        request: Option<String>,
    ) -> Result<AnyInstance> {
        let request = request.or_else(|| self.current_request_id());
        let ctx = ResolveCtx::new(request);
        self.resolve_ref_boxed(token_ref, ctx).await
    }

    /// Eager async resolution on behalf of a lazy stand-in
    pub(crate) async fn resolve_eager_async(
        self: Arc<Self>,
        token: Token,
        request: Option<String>,
    ) -> Result<AnyInstance> {
        let mut ctx = ResolveCtx::new(request);
        ctx.eager = Some(token.clone());
        self.resolve_token_async(token, ctx).await
    }

    /// Boxed recursion point; each dependency subtree owns its context
    pub(crate) fn resolve_ref_boxed(
        self: Arc<Self>,
        token_ref: TokenRef,
        ctx: ResolveCtx,
    ) -> BoxFuture<'static, Result<AnyInstance>> {
        async move {
            let token = token_ref.resolve()?;
            self.resolve_token_async(token, ctx).await
        }
        .boxed()
    }

    async fn resolve_token_async(
        self: Arc<Self>,
        token: Token,
        mut ctx: ResolveCtx,
    ) -> Result<AnyInstance> {
        let descriptor = self.descriptor_for(&token)?;
        self.check_condition(&token, &descriptor)?;

        if descriptor.lazy && !ctx.take_eager(&token) {
            return self.lazy_stand_in(&token, &descriptor, &ctx);
        }

        match descriptor.scope {
            ProviderScope::Singleton => {
                let singletons = self.singletons();
                self.resolve_cached_async(singletons, descriptor, token, ctx)
                    .await
            }
            ProviderScope::Request => match self.request_cache(&ctx) {
                Some(cache) => {
                    self.resolve_cached_async(cache, descriptor, token, ctx)
                        .await
                }
                None => {
                    self.warn_scope_fallback(&token);
                    self.construct_async(descriptor, token, ctx, None).await
                }
            },
            ProviderScope::Transient => {
                if ctx.in_path(&token) {
                    return Err(Error::circular_dependency(&ctx.path, &token));
                }
                self.construct_async(descriptor, token, ctx, None).await
            }
        }
    }

    async fn resolve_cached_async(
        self: Arc<Self>,
        cache: Arc<InstanceCache>,
        descriptor: ProviderDescriptor,
        token: Token,
        ctx: ResolveCtx,
    ) -> Result<AnyInstance> {
        loop {
            match cache.get(&token) {
                Some(CacheEntry::Ready(instance)) => return Ok(instance),
                Some(CacheEntry::Pending(placeholder)) => {
                    if ctx.in_path(&token) {
                        self.warn_cycle_recovered(&ctx.path, &token);
                        let stand_in: AnyInstance = placeholder;
                        return Ok(stand_in);
                    }
                    // Mid-construction on another logical task; wait for its
                    // completion notification, then re-check.
                    self.wait_for_completion(&cache, &token).await;
                }
                Some(CacheEntry::InFlight) => {
                    if ctx.in_path(&token) {
                        return Err(Error::circular_dependency(&ctx.path, &token));
                    }
                    self.wait_for_completion(&cache, &token).await;
                }
                None => {
                    if ctx.in_path(&token) {
                        return Err(Error::circular_dependency(&ctx.path, &token));
                    }
                    return self
                        .construct_async(descriptor, token, ctx, Some(cache))
                        .await;
                }
            }
        }
    }

    async fn wait_for_completion(&self, cache: &InstanceCache, token: &Token) {
        let notify = self.completion_notify(token);
        let notified = notify.notified();
        let mut notified = std::pin::pin!(notified);
        // Register before the re-check so a completion between the check and
        // the await cannot be missed.
        notified.as_mut().enable();
        if matches!(
            cache.get(token),
            Some(CacheEntry::Pending(_) | CacheEntry::InFlight)
        ) {
            notified.await;
        }
    }

    async fn construct_async(
        self: Arc<Self>,
        descriptor: ProviderDescriptor,
        token: Token,
        ctx: ResolveCtx,
        cache: Option<Arc<InstanceCache>>,
    ) -> Result<AnyInstance> {
        if let ProviderKind::Value(value) = &descriptor.kind {
            return Ok(value.clone());
        }

        if let Some(cache) = &cache {
            match &descriptor.kind {
                ProviderKind::Class(_) => {
                    cache.insert_pending(&token);
                }
                ProviderKind::Factory { .. } => cache.mark_in_flight(&token),
                ProviderKind::Value(_) => {}
            }
        }

        let produced = match &descriptor.kind {
            ProviderKind::Factory { factory, deps } => {
                match self.clone().resolve_args_async(deps, &token, &ctx).await {
                    Ok(args) => match factory {
                        FactoryKind::Sync(factory) => {
                            factory(&args).map_err(|error| Error::construction(&token, error))
                        }
                        FactoryKind::Async(factory) => factory(args)
                            .await
                            .map_err(|error| Error::construction(&token, error)),
                    },
                    Err(error) => Err(error),
                }
            }
            ProviderKind::Class(spec) => {
                match self
                    .clone()
                    .resolve_args_async(&spec.deps, &token, &ctx)
                    .await
                {
                    Ok(args) => {
                        (spec.ctor)(&args).map_err(|error| Error::construction(&token, error))
                    }
                    Err(error) => Err(error),
                }
            }
            ProviderKind::Value(value) => Ok(value.clone()),
        };

        self.finish_construction(&token, descriptor.scope, produced, cache.as_deref())
    }

    /// Resolve declared dependencies in parallel, preserving argument order
    async fn resolve_args_async(
        self: Arc<Self>,
        deps: &[TokenRef],
        parent: &Token,
        ctx: &ResolveCtx,
    ) -> Result<Vec<Injected>> {
        let subtrees: Vec<_> = deps
            .iter()
            .map(|dep| {
                self.clone()
                    .resolve_ref_boxed(dep.clone(), ctx.child_with(parent.clone()))
            })
            .collect();
        let instances = try_join_all(subtrees).await?;
        Ok(instances.into_iter().map(Injected::from_instance).collect())
    }
}
