//! Configuration loader
//!
//! Handles loading engine configuration from default values, a TOML file,
//! and prefixed environment variables, merged in that order with later
//! sources overriding earlier ones. Uses Figment for the merge.
//!
//! The `gate` section is deliberately opaque: it becomes the key-path
//! addressable object that dotted-path registration conditions are evaluated
//! against. The loader only transports it; the conditional gate walks it.

use std::env;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use modwire_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::constants::*;
use crate::logging::parse_log_level;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON-formatted log lines
    pub json_format: bool,
    /// Optional log file path (daily rotation)
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Lifecycle event bus configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Maximum retained history entries; absent keeps every event
    pub history_limit: Option<usize>,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Event bus settings
    pub events: EventBusConfig,
    /// Opaque object consulted by dotted-path registration conditions
    pub gate: Value,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            events: EventBusConfig::default(),
            // empty object rather than null so the config stays
            // TOML-serializable
            gate: Value::Object(serde_json::Map::new()),
        }
    }
}

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Configuration sources are merged in this order (later sources
    /// override earlier):
    /// 1. Default values from `EngineConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with prefix (e.g., `MODWIRE_LOGGING_LEVEL`)
    pub fn load(&self) -> Result<EngineConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                info!("configuration loaded from {}", config_path.display());
            } else {
                warn!("configuration file not found: {}", config_path.display());
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            info!("configuration loaded from {}", default_path.display());
        }

        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("_"));

        let config: EngineConfig = figment
            .extract()
            .map_err(|e| Error::configuration_with_source("failed to extract configuration", e))?;

        validate_engine_config(&config)?;
        Ok(config)
    }

    /// Reload configuration (useful for hot-reloading)
    pub fn reload(&self) -> Result<EngineConfig> {
        self.load()
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &EngineConfig, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| Error::configuration_with_source("failed to serialize config", e))?;
        std::fs::write(path.as_ref(), toml_string)?;
        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Find default configuration file paths to try
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = vec![
            current_dir.join(DEFAULT_CONFIG_FILENAME),
            current_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME),
            dirs::config_dir()
                .map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME))
                .unwrap_or_default(),
        ];

        candidates.into_iter().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate engine configuration
fn validate_engine_config(config: &EngineConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;
    if config.events.history_limit == Some(0) {
        return Err(Error::configuration(
            "event history limit cannot be 0; omit it to keep every event",
        ));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the event history bound
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.config.events.history_limit = Some(limit);
        self
    }

    /// Set the opaque gate configuration object
    pub fn with_gate(mut self, gate: Value) -> Self {
        self.config.gate = gate;
        self
    }

    /// Build the configuration
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
