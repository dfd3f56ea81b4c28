//! Dependency tokens and deferred (forward) references
//!
//! A [`Token`] is the identity under which a dependency is registered and
//! requested: either a concrete Rust type (compared by `TypeId`, so two
//! distinct types are distinct tokens even when their names collide) or an
//! opaque string key for non-type values.
//!
//! A [`ForwardRef`] wraps a zero-argument thunk that yields the real token
//! only when invoked. It exists to break declaration-order cycles: two types
//! that depend on each other can each register a thunk for the peer instead
//! of naming it directly.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// The identity under which a dependency is registered and requested
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A concrete Rust type, compared by `TypeId` identity
    Class {
        /// Type identity
        id: TypeId,
        /// Diagnostic name (not part of the identity)
        name: &'static str,
    },
    /// An opaque string key for non-type values
    Named(Arc<str>),
}

impl Token {
    /// Token for the concrete type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Class {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Token for an opaque string key
    pub fn named(name: impl AsRef<str>) -> Self {
        Token::Named(Arc::from(name.as_ref()))
    }

    /// Human-readable name for diagnostics and error messages
    pub fn name(&self) -> &str {
        match self {
            Token::Class { name, .. } => name,
            Token::Named(name) => name,
        }
    }

    /// Whether this token identifies a concrete type
    pub fn is_class(&self) -> bool {
        matches!(self, Token::Class { .. })
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Class { name, .. } => write!(f, "Token::Class({name})"),
            Token::Named(name) => write!(f, "Token::Named({name})"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thunk signature for deferred token references
pub type ForwardFn = dyn Fn() -> Result<Token> + Send + Sync;

/// A deferred reference to a token, invoked only at resolution time
///
/// Tagged wrapper type, deliberately distinguishable from a plain [`Token`]:
/// the resolution engine dereferences it as its first step, and a failing
/// thunk is fatal to the enclosing resolution.
#[derive(Clone)]
pub struct ForwardRef {
    thunk: Arc<ForwardFn>,
}

impl ForwardRef {
    /// Wrap a fallible thunk
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<Token> + Send + Sync + 'static,
    {
        Self {
            thunk: Arc::new(thunk),
        }
    }

    /// Invoke the thunk to obtain the concrete token
    pub fn resolve(&self) -> Result<Token> {
        (self.thunk)()
    }
}

impl fmt::Debug for ForwardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ForwardRef(..)")
    }
}

/// A token position that is either direct or deferred
#[derive(Clone, Debug)]
pub enum TokenRef {
    /// A plain token, usable as-is
    Direct(Token),
    /// A deferred reference that must be invoked to obtain the token
    Forward(ForwardRef),
}

impl TokenRef {
    /// Obtain the concrete token, invoking the thunk for forward references
    pub fn resolve(&self) -> Result<Token> {
        match self {
            TokenRef::Direct(token) => Ok(token.clone()),
            TokenRef::Forward(forward) => forward.resolve(),
        }
    }

    /// Token for the concrete type `T`, as a direct reference
    pub fn of<T: ?Sized + 'static>() -> Self {
        TokenRef::Direct(Token::of::<T>())
    }
}

impl From<Token> for TokenRef {
    fn from(token: Token) -> Self {
        TokenRef::Direct(token)
    }
}

/// Build a forward reference from an infallible thunk
///
/// Sugar for the common case where the thunk simply names a type that is not
/// declared yet at the point of registration:
///
/// ```
/// use modwire_domain::token::{forward_ref, Token};
///
/// struct ServiceB;
/// let dep = forward_ref(Token::of::<ServiceB>);
/// assert_eq!(dep.resolve().unwrap(), Token::of::<ServiceB>());
/// ```
pub fn forward_ref<F>(thunk: F) -> TokenRef
where
    F: Fn() -> Token + Send + Sync + 'static,
{
    TokenRef::Forward(ForwardRef::new(move || Ok(thunk())))
}
