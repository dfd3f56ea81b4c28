//! # modwire
//!
//! A declarative dependency-injection and module-composition engine.
//! Providers declare how a value is produced per token; modules group
//! providers and import one another; the container resolves, constructs,
//! and caches object graphs on demand.
//!
//! This crate is the public facade re-exporting the domain and engine
//! layers as a single dependency surface.
//!
//! ## Example
//!
//! ```
//! use modwire::prelude::*;
//!
//! struct Clock;
//!
//! let container = Container::builder().without_process_env().build();
//! container.register_provider(ProviderDescriptor::value_of(Token::named("PORT"), 8080_u16));
//! container.register_class::<Clock, _>(vec![], |_| Ok(Clock));
//!
//! let port = container.resolve(&Token::named("PORT")).unwrap();
//! assert_eq!(*port.downcast::<u16>().unwrap(), 8080);
//!
//! // Cataloged classes resolve without explicit registration.
//! let clock = container.resolve_as::<Clock>().unwrap();
//! let again = container.resolve_as::<Clock>().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&clock, &again));
//! ```
//!
//! ## Architecture
//!
//! - `domain` - tokens, descriptors, modules, conditions, events, errors
//! - `engine` - the container: store, graph walker, resolution, scopes,
//!   conditional gate, event bus, configuration, logging

/// Domain layer - tokens, descriptors, and contracts
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use modwire_domain::*;
}

/// Engine layer - the container and its infrastructure
///
/// Re-exports from the engine crate for convenience
pub mod engine {
    pub use modwire_engine::*;
}

/// Everything needed to register and resolve in one import
pub mod prelude {
    pub use modwire_domain::condition::{Condition, GateEnvironment};
    pub use modwire_domain::error::{Error, Result};
    pub use modwire_domain::events::{LifecycleEvent, LifecycleEventKind};
    pub use modwire_domain::instance::{AnyInstance, Injected, LateBound, Placeholder};
    pub use modwire_domain::module::{ModuleDescriptor, ModuleProvider, ModuleRef};
    pub use modwire_domain::provider::{
        ClassSpec, ProviderDescriptor, ProviderKind, ProviderScope,
    };
    pub use modwire_domain::token::{ForwardRef, Token, TokenRef, forward_ref};
    pub use modwire_engine::catalog::ClassRegistration;
    pub use modwire_engine::container::{Container, ContainerBuilder, RegistrationOutcome};
    pub use modwire_engine::graph::GraphSummary;
    pub use modwire_engine::resolve::LazyRef;
}

pub use prelude::*;
