//! The container
//!
//! [`Container`] is the explicit object owning all registries and caches:
//! provider store, class catalog, conditional gate, singleton cache, scope
//! manager, lifecycle event bus, and accumulated dependency warnings. There
//! is no process-wide static state; multiple independent containers coexist,
//! each with its own construction and teardown.
//!
//! The resolution algorithms live in [`crate::resolve`]; this module holds
//! the shared state and the public surface around it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use dashmap::DashMap;
use modwire_domain::condition::GateEnvironment;
use modwire_domain::error::{Error, Result};
use modwire_domain::events::LifecycleEventKind;
use modwire_domain::instance::{AnyInstance, Injected};
use modwire_domain::module::ModuleRef;
use modwire_domain::provider::ProviderDescriptor;
use modwire_domain::token::{Token, TokenRef};
use serde_json::Value;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::cache::InstanceCache;
use crate::catalog::{ClassCatalog, ClassRegistration};
use crate::config::EngineConfig;
use crate::events::LifecycleEventBus;
use crate::gate::ConditionalGate;
use crate::graph::{GraphSummary, ModuleGraphWalker};
use crate::resolve::ResolveCtx;
use crate::scope::ScopeManager;
use crate::store::{ProviderStore, StoreOutcome};

/// What a registration attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Descriptor inserted or overwritten
    Registered,
    /// An existing value descriptor absorbed a non-value registration
    IgnoredValueWins,
    /// The registration condition evaluated false; nothing was stored
    SkippedByCondition,
}

/// Shared state behind every [`Container`] handle
pub(crate) struct ContainerCore {
    store: ProviderStore,
    catalog: ClassCatalog,
    gate: ConditionalGate,
    singletons: Arc<InstanceCache>,
    scopes: ScopeManager,
    events: Arc<LifecycleEventBus>,
    warnings: Mutex<Vec<String>>,
    current_request: Mutex<Option<String>>,
    summary: Mutex<GraphSummary>,
    completions: DashMap<Token, Arc<Notify>>,
    lazy_stand_ins: DashMap<Token, AnyInstance>,
    weak_self: Weak<ContainerCore>,
}

impl ContainerCore {
    pub(crate) fn singletons(&self) -> Arc<InstanceCache> {
        self.singletons.clone()
    }

    pub(crate) fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub(crate) fn events(&self) -> &Arc<LifecycleEventBus> {
        &self.events
    }

    pub(crate) fn weak_self(&self) -> Weak<ContainerCore> {
        self.weak_self.clone()
    }

    pub(crate) fn current_request_id(&self) -> Option<String> {
        self.current_request
            .lock()
            .expect("current request poisoned")
            .clone()
    }

    /// Descriptor for a token, falling back to an implicit class provider
    ///
    /// A token absent from the store but present in the class catalog is
    /// auto-registered as an implicit singleton class provider, so any
    /// cataloged type can be resolved without explicit registration.
    pub(crate) fn descriptor_for(&self, token: &Token) -> Result<ProviderDescriptor> {
        if let Some(descriptor) = self.store.get(token) {
            return Ok(descriptor);
        }
        if let Some(descriptor) = self.catalog.descriptor_for(token) {
            debug!(token = %token, "auto-registering implicit class provider");
            self.register_descriptor(descriptor.clone());
            return Ok(descriptor);
        }
        Err(Error::no_provider(token))
    }

    /// Defensive re-check of a stored descriptor's condition
    pub(crate) fn check_condition(
        &self,
        token: &Token,
        descriptor: &ProviderDescriptor,
    ) -> Result<()> {
        if self.gate.allows(token, descriptor.condition.as_ref()) {
            Ok(())
        } else {
            Err(Error::unsatisfied_condition(token))
        }
    }

    /// Register a descriptor through the conditional gate into the store
    pub(crate) fn register_descriptor(
        &self,
        descriptor: ProviderDescriptor,
    ) -> RegistrationOutcome {
        if !self
            .gate
            .allows(&descriptor.token, descriptor.condition.as_ref())
        {
            self.events.emit(LifecycleEventKind::ProviderSkipped {
                token: descriptor.token.name().to_string(),
            });
            return RegistrationOutcome::SkippedByCondition;
        }
        let token = descriptor.token.clone();
        let scope = descriptor.scope;
        match self.store.register(descriptor) {
            StoreOutcome::Registered => {
                self.events.emit(LifecycleEventKind::ProviderRegistered {
                    token: token.name().to_string(),
                    scope,
                });
                RegistrationOutcome::Registered
            }
            StoreOutcome::IgnoredValueWins => RegistrationOutcome::IgnoredValueWins,
        }
    }

    /// Per-request cache for the call's request id, created on first sight
    pub(crate) fn request_cache(&self, ctx: &ResolveCtx) -> Option<Arc<InstanceCache>> {
        let request_id = ctx.request_id.as_deref()?;
        let (cache, created) = self.scopes.ensure(request_id);
        if created {
            self.events.emit(LifecycleEventKind::RequestScopeCreated {
                request_id: request_id.to_string(),
            });
        }
        Some(cache)
    }

    /// One cached stand-in per singleton lazy token
    pub(crate) fn singleton_stand_in(
        &self,
        token: &Token,
        make: impl FnOnce() -> AnyInstance,
    ) -> AnyInstance {
        self.lazy_stand_ins
            .entry(token.clone())
            .or_insert_with(make)
            .clone()
    }

    pub(crate) fn completion_notify(&self, token: &Token) -> Arc<Notify> {
        self.completions
            .entry(token.clone())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub(crate) fn notify_completion(&self, token: &Token) {
        if let Some((_, notify)) = self.completions.remove(token) {
            notify.notify_waiters();
        }
    }

    pub(crate) fn record_warning(&self, message: String) {
        warn!("{message}");
        self.warnings
            .lock()
            .expect("dependency warnings poisoned")
            .push(message);
    }

    pub(crate) fn warn_cycle_recovered(&self, path: &[Token], token: &Token) {
        let mut names: Vec<&str> = path.iter().map(Token::name).collect();
        names.push(token.name());
        self.record_warning(format!(
            "circular dependency recovered via placeholder: {}",
            names.join(" -> ")
        ));
    }

    pub(crate) fn warn_scope_fallback(&self, token: &Token) {
        self.record_warning(format!(
            "request-scoped provider '{token}' resolved without an active request context; \
             falling back to transient semantics"
        ));
    }

    fn merge_summary(&self, summary: &GraphSummary) {
        self.summary
            .lock()
            .expect("graph summary poisoned")
            .merge(summary);
    }

    fn summary_snapshot(&self) -> GraphSummary {
        self.summary.lock().expect("graph summary poisoned").clone()
    }
}

/// The dependency-injection container
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    /// Container with default settings (process environment, no gate
    /// config, unbounded event history)
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a container
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Walk a module graph, registering every reachable provider
    ///
    /// Returns the flattened summary of this walk. Summaries accumulate on
    /// the container across calls; see [`Container::controllers`] and
    /// [`Container::bootstrap_tokens`].
    pub fn register_module(&self, module: &ModuleRef) -> Result<GraphSummary> {
        let mut walker = ModuleGraphWalker::new(&self.core);
        walker.walk(module)?;
        let summary = walker.finish();
        self.core.merge_summary(&summary);
        Ok(summary)
    }

    /// Register a single provider descriptor
    pub fn register_provider(&self, descriptor: ProviderDescriptor) -> RegistrationOutcome {
        self.core.register_descriptor(descriptor)
    }

    /// Record constructor metadata for `T` in the class catalog
    pub fn register_class<T, F>(&self, deps: Vec<TokenRef>, ctor: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&[Injected]) -> Result<T> + Send + Sync + 'static,
    {
        self.core.catalog.register::<T, F>(deps, ctor);
    }

    /// Record a full catalog entry under an explicit token
    pub fn register_class_entry(&self, token: Token, registration: ClassRegistration) {
        self.core.catalog.register_entry(token, registration);
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve a token synchronously
    pub fn resolve(&self, token: &Token) -> Result<AnyInstance> {
        self.core
            .resolve_sync(&TokenRef::Direct(token.clone()), None)
    }

    /// Resolve a possibly-deferred token reference synchronously
    pub fn resolve_ref(&self, token_ref: &TokenRef) -> Result<AnyInstance> {
        self.core.resolve_sync(token_ref, None)
    }

    /// Resolve `T` under its type token and downcast
    pub fn resolve_as<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let token = Token::of::<T>();
        self.resolve(&token)?
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(&token, std::any::type_name::<T>()))
    }

    /// Resolve a token under an explicit request id
    pub fn resolve_with_request(&self, token: &Token, request_id: &str) -> Result<AnyInstance> {
        self.core.resolve_sync(
            &TokenRef::Direct(token.clone()),
            Some(request_id.to_string()),
        )
    }

    /// Resolve a token asynchronously
    ///
    /// Identical caching and cycle semantics to [`Container::resolve`];
    /// independent dependency subtrees resolve in parallel.
    pub async fn resolve_async(&self, token: &Token) -> Result<AnyInstance> {
        self.core
            .clone()
            .resolve_async_entry(TokenRef::Direct(token.clone()), None)
            .await
    }

    /// Resolve a possibly-deferred token reference asynchronously
    pub async fn resolve_ref_async(&self, token_ref: &TokenRef) -> Result<AnyInstance> {
        self.core
            .clone()
            .resolve_async_entry(token_ref.clone(), None)
            .await
    }

    /// Resolve `T` asynchronously under its type token and downcast
    pub async fn resolve_as_async<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let token = Token::of::<T>();
        self.resolve_async(&token)
            .await?
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(&token, std::any::type_name::<T>()))
    }

    /// Resolve a token asynchronously under an explicit request id
    pub async fn resolve_with_request_async(
        &self,
        token: &Token,
        request_id: &str,
    ) -> Result<AnyInstance> {
        self.core
            .clone()
            .resolve_async_entry(
                TokenRef::Direct(token.clone()),
                Some(request_id.to_string()),
            )
            .await
    }

    // ------------------------------------------------------------------
    // Request scopes
    // ------------------------------------------------------------------

    /// Create the per-request cache for an id (idempotent)
    pub fn begin_request(&self, request_id: &str) {
        let (_, created) = self.core.scopes.ensure(request_id);
        if created {
            self.core
                .events
                .emit(LifecycleEventKind::RequestScopeCreated {
                    request_id: request_id.to_string(),
                });
        }
    }

    /// Discard the per-request cache for an id
    ///
    /// Cleanup hooks on cached instances are the caller's responsibility
    /// and are not invoked. Returns whether a cache existed.
    pub fn end_request(&self, request_id: &str) -> bool {
        let removed = self.core.scopes.remove(request_id);
        if removed {
            self.core
                .events
                .emit(LifecycleEventKind::RequestScopeDestroyed {
                    request_id: request_id.to_string(),
                });
        }
        removed
    }

    /// Set the request id used by resolve calls without an explicit one
    pub fn set_current_request_id(&self, request_id: Option<&str>) {
        *self
            .core
            .current_request
            .lock()
            .expect("current request poisoned") = request_id.map(str::to_string);
    }

    /// The current ambient request id
    pub fn current_request_id(&self) -> Option<String> {
        self.core.current_request_id()
    }

    /// Number of active request scopes
    pub fn active_requests(&self) -> usize {
        self.core.scopes.active_requests()
    }

    // ------------------------------------------------------------------
    // Graph surface
    // ------------------------------------------------------------------

    /// Controller tokens accumulated across registered module graphs
    pub fn controllers(&self) -> Vec<Token> {
        self.core.summary_snapshot().controllers
    }

    /// Bootstrap tokens accumulated across registered module graphs
    pub fn bootstrap_tokens(&self) -> Vec<Token> {
        self.core.summary_snapshot().bootstrap
    }

    /// Full accumulated graph summary
    pub fn graph_summary(&self) -> GraphSummary {
        self.core.summary_snapshot()
    }

    /// Eagerly resolve every accumulated bootstrap token
    pub fn bootstrap(&self) -> Result<()> {
        for token in self.bootstrap_tokens() {
            self.resolve(&token)?;
        }
        Ok(())
    }

    /// Async variant of [`Container::bootstrap`]
    pub async fn bootstrap_async(&self) -> Result<()> {
        for token in self.bootstrap_tokens() {
            self.resolve_async(&token).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Human-readable cycle and scope-fallback warnings accumulated during
    /// resolution, independent of hard failures
    pub fn dependency_warnings(&self) -> Vec<String> {
        self.core
            .warnings
            .lock()
            .expect("dependency warnings poisoned")
            .clone()
    }

    /// The lifecycle event bus (subscription and history queries)
    pub fn events(&self) -> Arc<LifecycleEventBus> {
        self.core.events.clone()
    }

    /// All registered provider tokens
    pub fn provider_tokens(&self) -> Vec<Token> {
        self.core.store.tokens()
    }

    /// Number of cached singleton entries
    pub fn cached_singletons(&self) -> usize {
        self.core.singletons.len()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures and builds a [`Container`]
pub struct ContainerBuilder {
    capture_process_env: bool,
    env_overrides: HashMap<String, String>,
    gate_config: Value,
    history_limit: Option<usize>,
}

impl ContainerBuilder {
    /// Builder with default settings
    pub fn new() -> Self {
        Self {
            capture_process_env: true,
            env_overrides: HashMap::new(),
            gate_config: Value::Null,
            history_limit: None,
        }
    }

    /// Opaque configuration object for dotted-path gate conditions
    pub fn with_gate_config(mut self, config: Value) -> Self {
        self.gate_config = config;
        self
    }

    /// Override one environment variable in the gate snapshot
    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(name.into(), value.into());
        self
    }

    /// Start from an empty environment instead of a process-env snapshot
    ///
    /// Keeps gate evaluation deterministic in tests.
    pub fn without_process_env(mut self) -> Self {
        self.capture_process_env = false;
        self
    }

    /// Bound the lifecycle event history
    pub fn with_event_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Apply loader-produced settings (gate config, event history bound)
    pub fn with_engine_config(mut self, config: &EngineConfig) -> Self {
        self.gate_config = config.gate.clone();
        self.history_limit = config.events.history_limit;
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        let mut env = if self.capture_process_env {
            std::env::vars().collect::<HashMap<_, _>>()
        } else {
            HashMap::new()
        };
        env.extend(self.env_overrides);

        let gate = ConditionalGate::new(GateEnvironment::new(env, self.gate_config));
        let events = LifecycleEventBus::with_history_limit(self.history_limit);

        let core = Arc::new_cyclic(|weak| ContainerCore {
            store: ProviderStore::new(),
            catalog: ClassCatalog::new(),
            gate,
            singletons: Arc::new(InstanceCache::new()),
            scopes: ScopeManager::new(),
            events,
            warnings: Mutex::new(Vec::new()),
            current_request: Mutex::new(None),
            summary: Mutex::new(GraphSummary::default()),
            completions: DashMap::new(),
            lazy_stand_ins: DashMap::new(),
            weak_self: weak.clone(),
        });
        Container { core }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
