//! Configuration module for the registry.
//!
//! Provides YAML-based configuration loading and validation for the
//! database settings (engine, path, pool size, statement logging).

mod app;
mod validation;

pub use app::{AppConfig, DatabaseConfig};
pub use validation::{ConfigError, expand_env_vars};

// Re-export constants
pub use app::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_DB_PATH, DEFAULT_MAX_CONNECTIONS};
