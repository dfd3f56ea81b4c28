//! Instances, placeholders, and late-bound dependency views
//!
//! Constructed values travel through the container as type-erased
//! [`AnyInstance`] pointers. During two-phase construction of a singleton the
//! cache briefly holds a [`Placeholder`] instead: an incompletely-initialized
//! handle inserted before the provider's dependencies have resolved, so that
//! a circular dependency re-entering resolution for the same token receives
//! *something* with a stable identity. The handle's methods always answer
//! (behavior works); its target is absent until the fill step runs (fields
//! are unset). Holders keep the placeholder's identity and read the real
//! instance through it once construction completes.
//!
//! [`Injected`] is the per-dependency value handed to constructors and
//! factories; [`LateBound`] is its typed view for participants in a cycle.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::token::Token;

/// A type-erased, shared instance produced by the container
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Incompletely-initialized stand-in for an instance under construction
///
/// Inserted into the owning scope's cache *before* the provider's
/// dependencies resolve. [`Placeholder::get`] returns `None` until the
/// construction completes and the slot is filled; after that it returns the
/// real instance for every holder of this handle.
pub struct Placeholder {
    token: Token,
    slot: OnceLock<AnyInstance>,
}

impl Placeholder {
    /// Allocate an empty placeholder for `token`
    pub fn new(token: Token) -> Arc<Self> {
        Arc::new(Self {
            token,
            slot: OnceLock::new(),
        })
    }

    /// The token this placeholder stands in for
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Whether construction has completed and the target is available
    pub fn is_filled(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Fill the slot with the constructed instance
    ///
    /// Returns `false` if the slot was already filled; the first fill wins.
    pub fn fill(&self, instance: AnyInstance) -> bool {
        self.slot.set(instance).is_ok()
    }

    /// The constructed instance, if construction has completed
    pub fn get(&self) -> Option<AnyInstance> {
        self.slot.get().cloned()
    }
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("token", &self.token)
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// A resolved dependency as handed to constructors and factories
///
/// `Ready` carries a fully constructed instance. `Pending` carries the
/// placeholder of a token currently mid-construction on the same resolution
/// path - the recoverable circular-dependency case.
#[derive(Clone)]
pub enum Injected {
    /// A fully constructed instance
    Ready(AnyInstance),
    /// A placeholder for a token still mid-construction
    Pending(Arc<Placeholder>),
}

impl Injected {
    /// Classify a raw instance returned by the resolution engine
    ///
    /// A placeholder travels through the engine as an ordinary
    /// [`AnyInstance`]; this is where it is told apart again.
    pub fn from_instance(instance: AnyInstance) -> Self {
        match instance.downcast::<Placeholder>() {
            Ok(placeholder) => Injected::Pending(placeholder),
            Err(instance) => Injected::Ready(instance),
        }
    }

    /// The underlying instance, if available right now
    ///
    /// For `Pending`, this is `None` until the peer's construction completes.
    pub fn instance(&self) -> Option<AnyInstance> {
        match self {
            Injected::Ready(instance) => Some(instance.clone()),
            Injected::Pending(placeholder) => placeholder.get(),
        }
    }

    /// Whether this dependency is still mid-construction
    pub fn is_pending(&self) -> bool {
        matches!(self, Injected::Pending(_))
    }

    /// Downcast a ready instance to its concrete type
    ///
    /// Fails for a still-unfilled placeholder; cycle participants should use
    /// [`Injected::late_bound`] instead and read the peer after construction.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let token_hint = match self {
            Injected::Pending(placeholder) => Some(placeholder.token().clone()),
            Injected::Ready(_) => None,
        };
        let instance = self.instance().ok_or_else(|| {
            Error::type_mismatch(
                token_hint.as_ref().unwrap_or(&Token::of::<T>()),
                std::any::type_name::<T>(),
            )
        })?;
        instance
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(&Token::of::<T>(), std::any::type_name::<T>()))
    }

    /// Typed late-binding view over this dependency
    pub fn late_bound<T: ?Sized>(&self) -> LateBound<T> {
        LateBound {
            inner: self.clone(),
            _marker: PhantomData,
        }
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Injected::Ready(_) => f.write_str("Injected::Ready(..)"),
            Injected::Pending(placeholder) => {
                write!(f, "Injected::Pending({})", placeholder.token())
            }
        }
    }
}

/// Typed view over an injected value that may still be mid-construction
///
/// `get()` yields `None` while the peer's constructor has not reached its
/// completion step yet, and the working reference afterwards. This
/// asymmetry is the documented contract of two-phase construction: a
/// constructor that reads its late-bound dependency *during* construction
/// may observe it unset, while the same read after full graph construction
/// succeeds.
pub struct LateBound<T: ?Sized> {
    inner: Injected,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> LateBound<T> {
    /// The dependency, once its construction has completed
    pub fn get(&self) -> Option<Arc<T>> {
        self.inner.instance()?.downcast::<T>().ok()
    }
}

impl<T: ?Sized> Clone for LateBound<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for LateBound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LateBound<{}>", std::any::type_name::<T>())
    }
}
