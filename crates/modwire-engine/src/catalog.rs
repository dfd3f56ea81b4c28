//! Class Catalog - extracted constructor metadata per constructible type
//!
//! The engine never introspects types. How a constructor's parameter list is
//! produced (introspection, explicit registration, source annotations) is
//! outside this core; the catalog is where the embedding application hands
//! over the already-extracted result: per class token, the ordered
//! dependency list, the constructor, and the default scope/laziness.
//!
//! Two consumers read it: the module graph walker (bare-token provider
//! entries) and the resolution engine's implicit-provider fallback, which
//! lets any cataloged type be resolved without an explicit registration.

use std::collections::HashMap;
use std::sync::RwLock;

use modwire_domain::error::Result;
use modwire_domain::instance::Injected;
use modwire_domain::provider::{ClassSpec, ProviderDescriptor, ProviderKind, ProviderScope};
use modwire_domain::token::{Token, TokenRef};

/// Catalog entry: constructor metadata plus default provider settings
#[derive(Clone, Debug)]
pub struct ClassRegistration {
    /// Constructor and ordered dependency list
    pub spec: ClassSpec,
    /// Default caching scope when registered implicitly
    pub scope: ProviderScope,
    /// Expose a lazy stand-in when registered implicitly
    pub lazy: bool,
}

impl ClassRegistration {
    /// Registration with singleton scope and eager construction
    pub fn new(spec: ClassSpec) -> Self {
        Self {
            spec,
            scope: ProviderScope::Singleton,
            lazy: false,
        }
    }

    /// Override the default scope
    pub fn with_scope(mut self, scope: ProviderScope) -> Self {
        self.scope = scope;
        self
    }

    /// Mark construction lazy
    pub fn with_lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

/// Token -> class metadata registry
#[derive(Default)]
pub struct ClassCatalog {
    classes: RwLock<HashMap<Token, ClassRegistration>>,
}

impl ClassCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Record constructor metadata for `T` under its type token
    pub fn register<T, F>(&self, deps: Vec<TokenRef>, ctor: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&[Injected]) -> Result<T> + Send + Sync + 'static,
    {
        self.register_entry(
            Token::of::<T>(),
            ClassRegistration::new(ClassSpec::new(deps, ctor)),
        );
    }

    /// Record a full registration under an explicit token
    pub fn register_entry(&self, token: Token, registration: ClassRegistration) {
        self.classes
            .write()
            .expect("class catalog poisoned")
            .insert(token, registration);
    }

    /// Metadata for a token, if cataloged
    pub fn get(&self, token: &Token) -> Option<ClassRegistration> {
        self.classes
            .read()
            .expect("class catalog poisoned")
            .get(token)
            .cloned()
    }

    /// Whether metadata exists for the token
    pub fn contains(&self, token: &Token) -> bool {
        self.classes
            .read()
            .expect("class catalog poisoned")
            .contains_key(token)
    }

    /// Implicit provider descriptor for a cataloged token
    ///
    /// This is the convenience default of resolution: a cataloged type can
    /// be resolved without explicit registration, as a class provider under
    /// the catalog's recorded scope.
    pub fn descriptor_for(&self, token: &Token) -> Option<ProviderDescriptor> {
        let registration = self.get(token)?;
        Some(ProviderDescriptor {
            token: token.clone(),
            kind: ProviderKind::Class(registration.spec),
            scope: registration.scope,
            lazy: registration.lazy,
            condition: None,
        })
    }
}
