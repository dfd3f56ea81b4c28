//! Module Graph Walker
//!
//! Turns a root module into flat provider/controller registrations. The walk
//! is depth-first with imports recursed before a module's own providers, so
//! a module's providers can rely on imported providers being registered
//! already. A visited set keyed by descriptor identity short-circuits
//! modules reachable over several import paths (diamond imports register
//! exactly once).
//!
//! Deferred and dynamic module references are materialized before
//! inspection; a failing thunk aborts the walk - there is no partial-graph
//! recovery.

use std::collections::HashSet;
use std::sync::Arc;

use modwire_domain::error::Result;
use modwire_domain::events::LifecycleEventKind;
use modwire_domain::module::{ModuleDescriptor, ModuleProvider, ModuleRef};
use modwire_domain::token::Token;
use tracing::debug;

use crate::container::ContainerCore;

/// Flattened result of walking a module graph
///
/// Controllers, bootstrap tokens, and exports are accumulated across the
/// whole graph in traversal order; duplicates are allowed and callers
/// deduplicate if needed.
#[derive(Clone, Debug, Default)]
pub struct GraphSummary {
    /// Names of processed modules, in registration order
    pub modules: Vec<String>,
    /// Controller tokens for the transport layer to wire up
    pub controllers: Vec<Token>,
    /// Tokens to resolve eagerly at startup
    pub bootstrap: Vec<Token>,
    /// Exported tokens (diagnostics)
    pub exports: Vec<Token>,
}

impl GraphSummary {
    /// Fold another summary into this one
    pub fn merge(&mut self, other: &GraphSummary) {
        self.modules.extend(other.modules.iter().cloned());
        self.controllers.extend(other.controllers.iter().cloned());
        self.bootstrap.extend(other.bootstrap.iter().cloned());
        self.exports.extend(other.exports.iter().cloned());
    }
}

/// Depth-first walker populating the container's provider store
pub(crate) struct ModuleGraphWalker<'a> {
    core: &'a ContainerCore,
    visited: HashSet<usize>,
    summary: GraphSummary,
}

impl<'a> ModuleGraphWalker<'a> {
    pub(crate) fn new(core: &'a ContainerCore) -> Self {
        Self {
            core,
            visited: HashSet::new(),
            summary: GraphSummary::default(),
        }
    }

    /// Walk a module and everything it imports
    pub(crate) fn walk(&mut self, module: &ModuleRef) -> Result<()> {
        let descriptor = module.materialize()?;
        let identity = Arc::as_ptr(&descriptor) as usize;
        if !self.visited.insert(identity) {
            debug!(module = descriptor.name, "module already processed");
            return Ok(());
        }

        for import in &descriptor.imports {
            self.walk(import)?;
        }

        for provider in &descriptor.providers {
            self.register(&descriptor, provider);
        }

        self.summary
            .controllers
            .extend(descriptor.controllers.iter().cloned());
        self.summary
            .bootstrap
            .extend(descriptor.bootstrap.iter().cloned());
        self.summary
            .exports
            .extend(descriptor.exports.iter().cloned());
        self.summary.modules.push(descriptor.name.clone());

        self.core.events().emit(LifecycleEventKind::ModuleRegistered {
            module: descriptor.name.clone(),
        });
        Ok(())
    }

    /// The accumulated flattened lists
    pub(crate) fn finish(self) -> GraphSummary {
        self.summary
    }

    fn register(&self, module: &ModuleDescriptor, provider: &ModuleProvider) {
        match provider {
            ModuleProvider::Descriptor(descriptor) => {
                self.core.register_descriptor(descriptor.clone());
            }
            ModuleProvider::Token(token) => match self.core.catalog().descriptor_for(token) {
                Some(descriptor) => {
                    self.core.register_descriptor(descriptor);
                }
                None => {
                    // Left to the implicit-provider fallback at resolution
                    // time, in case the catalog entry arrives later.
                    debug!(
                        module = module.name,
                        token = %token,
                        "bare provider token not in class catalog; skipping registration"
                    );
                }
            },
        }
    }
}
