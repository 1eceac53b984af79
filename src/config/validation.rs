//! Configuration checks and `${VAR}` expansion.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use super::app::DatabaseConfig;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid YAML for [`super::AppConfig`].
    #[error("invalid YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Check the `database` section once file values and overrides are merged.
pub(crate) fn validate_database(db: &DatabaseConfig) -> Result<(), ConfigError> {
    let problem = if db.engine.is_none() {
        "database engine must be selected (sqlite or postgres)"
    } else if db.path.trim().is_empty() {
        "database path cannot be empty"
    } else if db.max_connections == 0 {
        "database max_connections must be positive"
    } else if db.acquire_timeout.is_zero() {
        "database acquire_timeout must be positive"
    } else {
        return Ok(());
    };
    Err(ConfigError::ValidationError(problem.to_string()))
}

/// Replace `${VAR}` and `${VAR:-fallback}` references with values from the
/// process environment. An unset variable without a fallback becomes empty.
pub fn expand_env_vars(input: &str) -> String {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();

    let reference = REFERENCE.get_or_init(|| {
        Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::-(?P<fallback>[^}]*))?\}")
            .expect("env reference pattern is valid")
    });

    reference
        .replace_all(input, |caps: &Captures| {
            std::env::var(&caps["name"]).unwrap_or_else(|_| {
                caps.name("fallback")
                    .map_or_else(String::new, |m| m.as_str().to_string())
            })
        })
        .into_owned()
}
