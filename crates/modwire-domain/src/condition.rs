//! Registration conditions and the environment they are evaluated against
//!
//! A [`Condition`] decides, at registration time, whether a provider
//! participates at all. Three predicate forms are supported and evaluated in
//! this precedence: explicit custom predicate function, named
//! environment-variable equality check, dotted-path configuration-value
//! equality check. The first form present on a condition wins.
//!
//! The configuration side is an opaque key-path-addressable object
//! ([`serde_json::Value`]) supplied by the embedding application; this crate
//! only walks it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Custom predicate signature
pub type PredicateFn = Arc<dyn Fn(&GateEnvironment) -> bool + Send + Sync>;

/// Snapshot of the data registration conditions are evaluated against
#[derive(Clone, Debug, Default)]
pub struct GateEnvironment {
    /// Environment variables visible to env-equality checks
    pub env: HashMap<String, String>,
    /// Opaque configuration object for dotted-path checks
    pub config: Value,
}

impl GateEnvironment {
    /// Build an environment from explicit values
    pub fn new(env: HashMap<String, String>, config: Value) -> Self {
        Self { env, config }
    }

    /// Look up an environment variable
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Walk a dotted path (`"cache.provider"`) into the configuration object
    pub fn config_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

/// Environment-variable equality check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvEquals {
    /// Variable name
    pub var: String,
    /// Expected value
    pub expected: String,
}

/// Dotted-path configuration-value equality check
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigEquals {
    /// Dotted path into the configuration object
    pub path: String,
    /// Expected value at that path
    pub expected: Value,
}

/// A registration condition attached to a provider descriptor
///
/// Multiple forms may be present; evaluation takes the highest-precedence
/// form and ignores the rest.
#[derive(Clone, Default)]
pub struct Condition {
    /// Explicit custom predicate (highest precedence)
    pub predicate: Option<PredicateFn>,
    /// Environment-variable equality check
    pub env: Option<EnvEquals>,
    /// Configuration-value equality check (lowest precedence)
    pub config: Option<ConfigEquals>,
}

impl Condition {
    /// Condition backed by a custom predicate
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&GateEnvironment) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
            ..Self::default()
        }
    }

    /// Condition requiring an environment variable to equal a value
    pub fn env_equals(var: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            env: Some(EnvEquals {
                var: var.into(),
                expected: expected.into(),
            }),
            ..Self::default()
        }
    }

    /// Condition requiring a configuration value at a dotted path
    pub fn config_equals(path: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            config: Some(ConfigEquals {
                path: path.into(),
                expected: expected.into(),
            }),
            ..Self::default()
        }
    }

    /// Evaluate against an environment; the highest-precedence form wins
    ///
    /// A condition with no form at all evaluates true (unconditional).
    pub fn evaluate(&self, environment: &GateEnvironment) -> bool {
        if let Some(predicate) = &self.predicate {
            return predicate(environment);
        }
        if let Some(check) = &self.env {
            return environment.env_var(&check.var) == Some(check.expected.as_str());
        }
        if let Some(check) = &self.config {
            return environment.config_path(&check.path) == Some(&check.expected);
        }
        true
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .field("env", &self.env)
            .field("config", &self.config)
            .finish()
    }
}
