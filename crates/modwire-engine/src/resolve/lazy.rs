//! Lazy stand-ins
//!
//! A provider marked lazy resolves to a [`LazyRef`] instead of an instance:
//! an indirection object holding a resolved-target slot. The first `get`
//! performs the real resolution (bypassing the lazy flag for that token);
//! every subsequent access returns the already-resolved target. No proxy
//! magic - callers reach the target through the stand-in explicitly.

use std::fmt;
use std::sync::{OnceLock, Weak};

use modwire_domain::error::{Error, Result};
use modwire_domain::instance::AnyInstance;
use modwire_domain::token::Token;
use std::sync::Arc;

use crate::container::ContainerCore;

/// Stand-in for a lazily constructed dependency
pub struct LazyRef {
    core: Weak<ContainerCore>,
    token: Token,
    request_id: Option<String>,
    target: OnceLock<AnyInstance>,
}

impl LazyRef {
    pub(crate) fn new(core: Weak<ContainerCore>, token: Token, request_id: Option<String>) -> Self {
        Self {
            core,
            token,
            request_id,
            target: OnceLock::new(),
        }
    }

    /// The token this stand-in defers
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Whether the target has been resolved through this stand-in
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// The target, resolving it on first access
    pub fn get(&self) -> Result<AnyInstance> {
        if let Some(target) = self.target.get() {
            return Ok(target.clone());
        }
        let core = self.upgrade()?;
        let instance = core.resolve_eager_sync(&self.token, self.request_id.clone())?;
        Ok(self.target.get_or_init(|| instance).clone())
    }

    /// The target, resolving it on first access through the async path
    ///
    /// Required when the underlying provider uses an async factory.
    pub async fn get_async(&self) -> Result<AnyInstance> {
        if let Some(target) = self.target.get() {
            return Ok(target.clone());
        }
        let core = self.upgrade()?;
        let instance = core
            .resolve_eager_async(self.token.clone(), self.request_id.clone())
            .await?;
        Ok(self.target.get_or_init(|| instance).clone())
    }

    /// Typed access to the target
    pub fn get_as<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get()?
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(&self.token, std::any::type_name::<T>()))
    }

    fn upgrade(&self) -> Result<Arc<ContainerCore>> {
        self.core
            .upgrade()
            .ok_or_else(|| Error::from("container dropped before lazy resolution"))
    }
}

impl fmt::Debug for LazyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRef")
            .field("token", &self.token)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
