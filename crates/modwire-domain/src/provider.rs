//! Provider descriptors - how to produce a value for a token
//!
//! A [`ProviderDescriptor`] is the single registration unit of the
//! container: the token it supplies, exactly one authoritative production
//! kind (value, factory, or class), a caching scope, a laziness flag, and an
//! optional registration condition.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::Result;
use crate::instance::{AnyInstance, Injected};
use crate::token::{Token, TokenRef};

/// Caching/lifetime policy for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderScope {
    /// One instance for the lifetime of the container
    #[default]
    Singleton,
    /// A fresh instance on every resolution
    Transient,
    /// One instance per logical request
    Request,
}

impl ProviderScope {
    /// Lowercase label used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderScope::Singleton => "singleton",
            ProviderScope::Transient => "transient",
            ProviderScope::Request => "request",
        }
    }
}

impl fmt::Display for ProviderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous factory signature
pub type FactoryFn = Arc<dyn Fn(&[Injected]) -> Result<AnyInstance> + Send + Sync>;

/// Asynchronous factory signature
///
/// Suspension is allowed only at dependency boundaries, never
/// mid-construction of a single instance; the factory receives its
/// dependencies fully resolved and returns one future for the value.
pub type AsyncFactoryFn =
    Arc<dyn Fn(Vec<Injected>) -> BoxFuture<'static, Result<AnyInstance>> + Send + Sync>;

/// Constructor signature for class providers
///
/// Constructors are synchronous by contract: a single instance is never
/// half-built across a suspension point.
pub type ConstructorFn = Arc<dyn Fn(&[Injected]) -> Result<AnyInstance> + Send + Sync>;

/// A factory in either flavor
#[derive(Clone)]
pub enum FactoryKind {
    /// Plain synchronous factory
    Sync(FactoryFn),
    /// Future-returning factory; only resolvable through the async path
    Async(AsyncFactoryFn),
}

impl fmt::Debug for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryKind::Sync(_) => f.write_str("FactoryKind::Sync"),
            FactoryKind::Async(_) => f.write_str("FactoryKind::Async"),
        }
    }
}

/// Constructor plus ordered dependency list for a class provider
///
/// The dependency list is the already-extracted per-parameter token list:
/// an explicit per-parameter token override simply *is* the entry at that
/// position.
#[derive(Clone)]
pub struct ClassSpec {
    /// Declared dependencies, in constructor-parameter order
    pub deps: Vec<TokenRef>,
    /// The constructor, invoked with the resolved dependencies
    pub ctor: ConstructorFn,
}

impl ClassSpec {
    /// Build a spec from a typed constructor
    pub fn new<T, F>(deps: Vec<TokenRef>, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&[Injected]) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            deps,
            ctor: Arc::new(move |injected| Ok(Arc::new(ctor(injected)?) as AnyInstance)),
        }
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("deps", &self.deps.len())
            .finish()
    }
}

/// How to produce a value for a token; exactly one kind is authoritative
#[derive(Clone, Debug)]
pub enum ProviderKind {
    /// A pre-built value, returned directly with no recursion
    Value(AnyInstance),
    /// A factory invoked with its resolved dependencies in declared order
    Factory {
        /// The factory itself
        factory: FactoryKind,
        /// Declared dependencies, in argument order
        deps: Vec<TokenRef>,
    },
    /// A class constructed through the two-phase placeholder protocol
    Class(ClassSpec),
}

impl ProviderKind {
    /// Short label for logs and store diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            ProviderKind::Value(_) => "value",
            ProviderKind::Factory { .. } => "factory",
            ProviderKind::Class(_) => "class",
        }
    }

    /// Whether this is a value provider (relevant to the anti-override rule)
    pub fn is_value(&self) -> bool {
        matches!(self, ProviderKind::Value(_))
    }
}

/// The registration unit of the container
#[derive(Clone, Debug)]
pub struct ProviderDescriptor {
    /// Token this provider supplies
    pub token: Token,
    /// Authoritative production kind
    pub kind: ProviderKind,
    /// Caching scope
    pub scope: ProviderScope,
    /// Expose a lazy stand-in instead of constructing eagerly
    pub lazy: bool,
    /// Optional registration condition
    pub condition: Option<Condition>,
}

impl ProviderDescriptor {
    /// Value provider for an already type-erased instance
    pub fn value(token: Token, value: AnyInstance) -> Self {
        Self {
            token,
            kind: ProviderKind::Value(value),
            scope: ProviderScope::Singleton,
            lazy: false,
            condition: None,
        }
    }

    /// Value provider wrapping a concrete value
    pub fn value_of<T: Send + Sync + 'static>(token: Token, value: T) -> Self {
        Self::value(token, Arc::new(value) as AnyInstance)
    }

    /// Synchronous factory provider
    pub fn factory<T, F>(token: Token, deps: Vec<TokenRef>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&[Injected]) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            token,
            kind: ProviderKind::Factory {
                factory: FactoryKind::Sync(Arc::new(move |injected| {
                    Ok(Arc::new(factory(injected)?) as AnyInstance)
                })),
                deps,
            },
            scope: ProviderScope::Singleton,
            lazy: false,
            condition: None,
        }
    }

    /// Asynchronous factory provider
    pub fn async_factory(token: Token, deps: Vec<TokenRef>, factory: AsyncFactoryFn) -> Self {
        Self {
            token,
            kind: ProviderKind::Factory {
                factory: FactoryKind::Async(factory),
                deps,
            },
            scope: ProviderScope::Singleton,
            lazy: false,
            condition: None,
        }
    }

    /// Class provider for an explicit spec under an explicit token
    pub fn class(token: Token, spec: ClassSpec) -> Self {
        Self {
            token,
            kind: ProviderKind::Class(spec),
            scope: ProviderScope::Singleton,
            lazy: false,
            condition: None,
        }
    }

    /// Class provider for `T` under its own type token
    pub fn class_of<T, F>(deps: Vec<TokenRef>, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&[Injected]) -> Result<T> + Send + Sync + 'static,
    {
        Self::class(Token::of::<T>(), ClassSpec::new(deps, ctor))
    }

    /// Override the scope
    pub fn with_scope(mut self, scope: ProviderScope) -> Self {
        self.scope = scope;
        self
    }

    /// Mark the provider lazy: resolution yields a stand-in that defers
    /// construction until first access
    pub fn with_lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Gate the registration on a condition
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}
