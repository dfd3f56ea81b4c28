//! Conditional Gate - registration-time predicate evaluation
//!
//! Decides whether a conditional provider participates at all. The gate owns
//! the [`GateEnvironment`] snapshot (environment variables plus the opaque
//! configuration object) and evaluates descriptor conditions against it; the
//! predicate precedence itself lives on [`Condition`].

use modwire_domain::condition::{Condition, GateEnvironment};
use modwire_domain::token::Token;
use tracing::debug;

/// Registration-time condition evaluator
pub struct ConditionalGate {
    environment: GateEnvironment,
}

impl ConditionalGate {
    /// Gate over a fixed environment snapshot
    pub fn new(environment: GateEnvironment) -> Self {
        Self { environment }
    }

    /// The environment conditions are evaluated against
    pub fn environment(&self) -> &GateEnvironment {
        &self.environment
    }

    /// Evaluate a descriptor's condition; an absent condition passes
    pub fn allows(&self, token: &Token, condition: Option<&Condition>) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        let allowed = condition.evaluate(&self.environment);
        if !allowed {
            debug!(token = %token, "registration condition evaluated false");
        }
        allowed
    }
}
