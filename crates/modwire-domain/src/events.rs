//! Lifecycle events
//!
//! Structured notifications emitted by the container for observability and
//! testing: module registrations, provider registrations (and skips through
//! the conditional gate), instance creations, request-scope lifecycle.
//! Each kind carries a stable dotted label so history queries can match by
//! prefix (`"scope.request"` matches both creation and teardown).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderScope;

/// Event kinds emitted over the container lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LifecycleEventKind {
    /// A module's providers and controllers were registered
    ModuleRegistered {
        /// Module diagnostic name
        module: String,
    },
    /// A provider was registered into the store
    ProviderRegistered {
        /// Token name
        token: String,
        /// Caching scope
        scope: ProviderScope,
    },
    /// A provider's registration condition evaluated false; registration
    /// became a no-op
    ProviderSkipped {
        /// Token name
        token: String,
    },
    /// An instance finished construction
    InstanceCreated {
        /// Token name
        token: String,
        /// Scope the instance was cached under
        scope: ProviderScope,
    },
    /// A per-request cache was created
    RequestScopeCreated {
        /// Request id
        request_id: String,
    },
    /// A per-request cache was discarded
    RequestScopeDestroyed {
        /// Request id
        request_id: String,
    },
}

impl LifecycleEventKind {
    /// Stable dotted label, used for prefix queries over the history
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleEventKind::ModuleRegistered { .. } => "module.registered",
            LifecycleEventKind::ProviderRegistered { .. } => "provider.registered",
            LifecycleEventKind::ProviderSkipped { .. } => "provider.skipped",
            LifecycleEventKind::InstanceCreated { .. } => "instance.created",
            LifecycleEventKind::RequestScopeCreated { .. } => "scope.request.created",
            LifecycleEventKind::RequestScopeDestroyed { .. } => "scope.request.destroyed",
        }
    }
}

/// A lifecycle event with its emission timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened
    pub kind: LifecycleEventKind,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Stamp an event with the current time
    pub fn new(kind: LifecycleEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// The kind's dotted label
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}
