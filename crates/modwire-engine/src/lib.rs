//! # modwire Engine
//!
//! The modwire container: a dependency-injection and module-composition
//! engine. Providers declare how to produce a value per token; modules group
//! providers and import one another; the container walks the module graph,
//! registers everything once, and resolves object graphs on demand with
//! singleton / transient / per-request scoping, lazy construction,
//! conditional registration, and two-phase placeholder construction for
//! circular singleton dependencies.
//!
//! ## Modules
//!
//! ### Container Core
//! | Module | Description |
//! |--------|-------------|
//! | [`container`] | The container object, builder, and public surface |
//! | [`store`] | Provider descriptor store (value-wins invariant) |
//! | [`graph`] | Depth-first module graph walker |
//! | [`resolve`] | Sync/async resolution engines, lazy stand-ins |
//! | [`scope`] | Per-request sub-containers |
//! | [`catalog`] | Extracted constructor metadata per class |
//! | [`gate`] | Registration-time condition evaluation |
//!
//! ### Observability & Configuration
//! | Module | Description |
//! |--------|-------------|
//! | [`events`] | Lifecycle event bus with bounded history |
//! | [`config`] | Figment-based configuration loader |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | Centralized configuration constants |

mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod container;
pub mod events;
pub mod gate;
pub mod graph;
pub mod logging;
pub mod resolve;
pub mod scope;
pub mod store;

// Re-export commonly used types
pub use catalog::{ClassCatalog, ClassRegistration};
pub use config::{ConfigBuilder, ConfigLoader, EngineConfig, EventBusConfig, LoggingConfig};
pub use container::{Container, ContainerBuilder, RegistrationOutcome};
pub use events::{LifecycleEventBus, Subscription};
pub use graph::GraphSummary;
pub use resolve::LazyRef;
pub use store::{ProviderStore, StoreOutcome};
