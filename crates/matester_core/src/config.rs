//! Store connection settings.
//!
//! # Responsibility
//! - Load pool sizing and connection lifetime settings from the environment.
//! - Provide defaults for programmatic construction in tests and tools.
//!
//! # Invariants
//! - `max_connections` is always at least 1.
//! - Durations are strictly positive.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "MATESTER_DB";
pub const MAX_CONNECTIONS_ENV: &str = "MATESTER_DB_MAX_CONNECTIONS";
pub const MAX_LIFETIME_ENV: &str = "MATESTER_DB_MAX_LIFETIME_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "MATESTER_DB_CONNECT_TIMEOUT_SECS";
/// Absolute directory for file logs; logging stays off when unset.
pub const LOG_DIR_ENV: &str = "MATESTER_LOG_DIR";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(3 * 60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(var) => write!(f, "environment variable `{var}` is not set"),
            Self::InvalidValue { var, value, reason } => {
                write!(f, "invalid value `{value}` for `{var}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Connection pool settings for the relational store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// SQLite database file path.
    pub database_path: PathBuf,
    /// Upper bound of simultaneously open connections.
    pub max_connections: u32,
    /// Connections older than this are closed on return to the pool.
    pub max_lifetime: Duration,
    /// How long a checkout waits for a free connection.
    pub connection_timeout: Duration,
}

impl DbConfig {
    /// Builds a config for `database_path` with default pool bounds.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_lifetime: DEFAULT_MAX_LIFETIME,
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Loads settings from process environment variables.
    ///
    /// # Errors
    /// - `MissingVar` when `MATESTER_DB` is unset or blank.
    /// - `InvalidValue` when an optional numeric variable is not a positive integer.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(DB_PATH_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVar(DB_PATH_ENV))?;

        let mut config = Self::new(path);
        if let Some(value) = lookup(MAX_CONNECTIONS_ENV) {
            config.max_connections = parse_positive(MAX_CONNECTIONS_ENV, &value)?;
        }
        if let Some(value) = lookup(MAX_LIFETIME_ENV) {
            config.max_lifetime =
                Duration::from_secs(u64::from(parse_positive(MAX_LIFETIME_ENV, &value)?));
        }
        if let Some(value) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connection_timeout =
                Duration::from_secs(u64::from(parse_positive(CONNECT_TIMEOUT_ENV, &value)?));
        }
        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: &str) -> ConfigResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero",
        }),
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a positive integer",
        }),
    }
}
