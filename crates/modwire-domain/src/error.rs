//! Error handling types

use thiserror::Error;

use crate::token::Token;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the modwire container
#[derive(Error, Debug)]
pub enum Error {
    /// Resolution requested for a token with no descriptor and no
    /// implicit-class fallback
    #[error("no provider for token '{token}'")]
    NoProvider {
        /// The token that could not be resolved
        token: String,
    },

    /// Provider exists but its registration condition evaluated false.
    /// Callers treat this identically to an unregistered token.
    #[error("provider for token '{token}' has an unsatisfied registration condition")]
    UnsatisfiedCondition {
        /// The gated token
        token: String,
    },

    /// A token was re-entered before any placeholder existed for it
    #[error("circular dependency detected: {path}")]
    CircularDependency {
        /// Token names on the cycle, joined in resolution order
        path: String,
    },

    /// A singleton token is mid-construction on another logical task and the
    /// synchronous engine cannot wait for it
    #[error("token '{token}' is being resolved concurrently by another task")]
    ConcurrentResolution {
        /// The contended token
        token: String,
    },

    /// A deferred module or class reference thunk failed; fatal to bootstrap
    #[error("deferred reference failed: {message}")]
    DeferredReference {
        /// Description of the thunk failure
        message: String,
    },

    /// A factory or constructor returned an error while building an instance
    #[error("construction of '{token}' failed: {source}")]
    Construction {
        /// The token under construction
        token: String,
        /// The factory/constructor error
        #[source]
        source: Box<Error>,
    },

    /// A provider backed by an async factory was requested through the
    /// synchronous resolution path
    #[error("token '{token}' uses an async factory and requires resolve_async")]
    SyncResolveUnsupported {
        /// The async-only token
        token: String,
    },

    /// A resolved instance could not be downcast to the requested type
    #[error("type mismatch for token '{token}': expected {expected}")]
    TypeMismatch {
        /// The token whose instance was downcast
        token: String,
        /// The requested concrete type
        expected: &'static str,
    },

    /// Configuration-related error
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Generic string-based error
    #[error("{0}")]
    String(String),
}

// Resolution error creation methods
impl Error {
    /// Create a no-provider error naming the token
    pub fn no_provider(token: &Token) -> Self {
        Self::NoProvider {
            token: token.name().to_string(),
        }
    }

    /// Create an unsatisfied-condition error for a gated token
    pub fn unsatisfied_condition(token: &Token) -> Self {
        Self::UnsatisfiedCondition {
            token: token.name().to_string(),
        }
    }

    /// Create a circular-dependency error from the resolution path
    ///
    /// The path is joined with ` -> ` and terminated with the re-entered
    /// token so the full cycle is visible in the message.
    pub fn circular_dependency<'a, I>(path: I, reentered: &Token) -> Self
    where
        I: IntoIterator<Item = &'a Token>,
    {
        let mut names: Vec<&str> = path.into_iter().map(Token::name).collect();
        names.push(reentered.name());
        Self::CircularDependency {
            path: names.join(" -> "),
        }
    }

    /// Create a concurrent-resolution error
    pub fn concurrent_resolution(token: &Token) -> Self {
        Self::ConcurrentResolution {
            token: token.name().to_string(),
        }
    }

    /// Create a deferred-reference error
    pub fn deferred_reference<S: Into<String>>(message: S) -> Self {
        Self::DeferredReference {
            message: message.into(),
        }
    }

    /// Wrap a factory/constructor error for the token under construction
    pub fn construction(token: &Token, source: Error) -> Self {
        Self::Construction {
            token: token.name().to_string(),
            source: Box::new(source),
        }
    }

    /// Create a sync-resolve-unsupported error for an async-only provider
    pub fn sync_resolve_unsupported(token: &Token) -> Self {
        Self::SyncResolveUnsupported {
            token: token.name().to_string(),
        }
    }

    /// Create a type-mismatch error for a failed downcast
    pub fn type_mismatch(token: &Token, expected: &'static str) -> Self {
        Self::TypeMismatch {
            token: token.name().to_string(),
            expected,
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
