//! Centralized configuration constants

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "MODWIRE";

/// Environment variable consulted for the log filter
pub const LOG_ENV_VAR: &str = "MODWIRE_LOG";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "modwire.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "modwire";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
