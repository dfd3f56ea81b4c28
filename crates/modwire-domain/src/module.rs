//! Module descriptors and module references
//!
//! A [`ModuleDescriptor`] groups providers, controllers, exports, and
//! bootstrap tokens, and imports other modules. A [`ModuleRef`] is how one
//! module names another: directly, through a factory producing a descriptor
//! ("dynamic module"), or through a deferred thunk ("forward module
//! reference") that breaks declaration-order cycles between modules.
//!
//! Module identity is `Arc` pointer identity of the descriptor: a module
//! reachable over several import paths is processed once as long as every
//! path hands out clones of the same `Arc`. A thunk that builds a fresh
//! descriptor per invocation deliberately produces distinct modules.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::provider::ProviderDescriptor;
use crate::token::Token;

/// A provider entry inside a module
#[derive(Clone, Debug)]
pub enum ModuleProvider {
    /// A full provider descriptor
    Descriptor(ProviderDescriptor),
    /// A bare class token, completed from the class catalog at registration
    Token(Token),
}

impl From<ProviderDescriptor> for ModuleProvider {
    fn from(descriptor: ProviderDescriptor) -> Self {
        ModuleProvider::Descriptor(descriptor)
    }
}

impl From<Token> for ModuleProvider {
    fn from(token: Token) -> Self {
        ModuleProvider::Token(token)
    }
}

/// A module: imports, providers, controllers, exports, bootstrap tokens
#[derive(Default)]
pub struct ModuleDescriptor {
    /// Diagnostic name
    pub name: String,
    /// Imported modules, walked depth-first before this module's providers
    pub imports: Vec<ModuleRef>,
    /// Providers registered by this module
    pub providers: Vec<ModuleProvider>,
    /// Controller tokens, accumulated for the transport layer
    pub controllers: Vec<Token>,
    /// Exported tokens (recorded for diagnostics)
    pub exports: Vec<Token>,
    /// Tokens resolved eagerly at application startup
    pub bootstrap: Vec<Token>,
}

impl ModuleDescriptor {
    /// New empty module with a diagnostic name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an imported module
    pub fn with_import(mut self, import: ModuleRef) -> Self {
        self.imports.push(import);
        self
    }

    /// Add a provider entry
    pub fn with_provider(mut self, provider: impl Into<ModuleProvider>) -> Self {
        self.providers.push(provider.into());
        self
    }

    /// Add a controller token
    pub fn with_controller(mut self, token: Token) -> Self {
        self.controllers.push(token);
        self
    }

    /// Add an exported token
    pub fn with_export(mut self, token: Token) -> Self {
        self.exports.push(token);
        self
    }

    /// Add a bootstrap token
    pub fn with_bootstrap(mut self, token: Token) -> Self {
        self.bootstrap.push(token);
        self
    }

    /// Finish building: wrap into a directly-referenced module
    pub fn into_ref(self) -> ModuleRef {
        ModuleRef::Direct(Arc::new(self))
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("imports", &self.imports.len())
            .field("providers", &self.providers.len())
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

/// Thunk signature for dynamic and forward module references
pub type ModuleThunk = Arc<dyn Fn() -> Result<Arc<ModuleDescriptor>> + Send + Sync>;

/// How one module names another
#[derive(Clone)]
pub enum ModuleRef {
    /// A concrete descriptor
    Direct(Arc<ModuleDescriptor>),
    /// A factory producing a descriptor ("dynamic module")
    Dynamic(ModuleThunk),
    /// A deferred thunk breaking declaration-order cycles
    Forward(ModuleThunk),
}

impl ModuleRef {
    /// Direct reference to a descriptor
    pub fn direct(module: ModuleDescriptor) -> Self {
        ModuleRef::Direct(Arc::new(module))
    }

    /// Dynamic module built by a factory
    pub fn dynamic<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<ModuleDescriptor>> + Send + Sync + 'static,
    {
        ModuleRef::Dynamic(Arc::new(factory))
    }

    /// Forward reference resolved only when the graph is walked
    pub fn forward<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<Arc<ModuleDescriptor>> + Send + Sync + 'static,
    {
        ModuleRef::Forward(Arc::new(thunk))
    }

    /// Obtain the concrete descriptor, invoking thunks as needed
    pub fn materialize(&self) -> Result<Arc<ModuleDescriptor>> {
        match self {
            ModuleRef::Direct(descriptor) => Ok(descriptor.clone()),
            ModuleRef::Dynamic(thunk) | ModuleRef::Forward(thunk) => thunk(),
        }
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleRef::Direct(descriptor) => write!(f, "ModuleRef::Direct({})", descriptor.name),
            ModuleRef::Dynamic(_) => f.write_str("ModuleRef::Dynamic(..)"),
            ModuleRef::Forward(_) => f.write_str("ModuleRef::Forward(..)"),
        }
    }
}
