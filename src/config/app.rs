//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::{DatabaseEngine, RegistryBuilder};

use super::validation::{ConfigError, expand_env_vars, validate_database};

// =============================================================================
// Constants
// =============================================================================

/// Default database file path.
pub const DEFAULT_DB_PATH: &str = "meshreg.db";

/// Default connection pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default pool acquire timeout (30 seconds).
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

fn default_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_ACQUIRE_TIMEOUT
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
///
/// `engine` has no default: a configuration that does not pick one, either
/// in the file or through an override, fails validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Storage engine (`sqlite` or `postgres`).
    #[serde(default)]
    pub engine: Option<DatabaseEngine>,

    /// Database file path for file-based engines (default: "meshreg.db").
    /// `${VAR}` and `${VAR:-default}` are expanded on load.
    #[serde(default = "default_path")]
    pub path: String,

    /// Connection pool size (default: 5).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long to wait for a pooled connection (default: "30s").
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// Log every executed statement through tracing (default: false).
    #[serde(default)]
    pub log_statements: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: None,
            path: default_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            log_statements: false,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse, expand and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.database.path = expand_env_vars(&config.database.path);
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)
    }

    /// Storage builder configured from this file.
    ///
    /// Without a selected engine the returned builder refuses to build.
    pub fn registry_builder(&self) -> RegistryBuilder {
        let builder = match self.database.engine {
            Some(engine) => RegistryBuilder::new(&self.database.path).engine(engine),
            None => RegistryBuilder::new(&self.database.path),
        };
        builder
            .max_connections(self.database.max_connections)
            .acquire_timeout(self.database.acquire_timeout)
            .log_statements(self.database.log_statements)
    }
}
