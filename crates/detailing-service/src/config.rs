//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                         | Default                          |
//! |----------------------------------|----------------------------------|
//! | `DETAILING_DATABASE_PATH`        | `./detailing.db`                 |
//! | `DETAILING_DB_MAX_CONNECTIONS`   | `5`                              |
//! | `DETAILING_TX_TIMEOUT_MS`        | `5000`                           |
//! | `DETAILING_AUDIT_QUEUE_CAPACITY` | `1024`                           |
//! | `DETAILING_LOG`                  | `info,detailing=debug,sqlx=warn` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use detailing_db::DbConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,detailing=debug,sqlx=warn";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file, or `:memory:`
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Deadline for one sale or status transaction, in milliseconds
    pub tx_timeout_ms: u64,

    /// Bounded audit queue length
    pub audit_queue_capacity: usize,

    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: "./detailing.db".to_string(),
            max_connections: 5,
            tx_timeout_ms: 5000,
            audit_queue_capacity: 1024,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// when it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup("DETAILING_DATABASE_PATH").unwrap_or(defaults.database_path),

            max_connections: parse_or(
                &lookup,
                "DETAILING_DB_MAX_CONNECTIONS",
                defaults.max_connections,
            )?,

            tx_timeout_ms: parse_or(&lookup, "DETAILING_TX_TIMEOUT_MS", defaults.tx_timeout_ms)?,

            audit_queue_capacity: parse_or(
                &lookup,
                "DETAILING_AUDIT_QUEUE_CAPACITY",
                defaults.audit_queue_capacity,
            )?,

            log_filter: lookup("DETAILING_LOG").unwrap_or(defaults.log_filter),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DETAILING_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.tx_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("DETAILING_TX_TIMEOUT_MS".to_string()));
        }
        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "DETAILING_DATABASE_PATH".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout_ms)
    }

    /// Database settings derived from this configuration.
    ///
    /// An in-memory database always gets the single-connection test setup,
    /// since every extra connection would open a separate empty database.
    pub fn db_config(&self) -> DbConfig {
        let config = DbConfig::new(&self.database_path);
        if config.is_in_memory() {
            return DbConfig::in_memory();
        }
        config.max_connections(self.max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.tx_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("DETAILING_DATABASE_PATH", ":memory:"),
            ("DETAILING_DB_MAX_CONNECTIONS", "2"),
            ("DETAILING_TX_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections, 2);
        assert_eq!(config.tx_timeout(), Duration::from_millis(250));
        assert!(config.db_config().is_in_memory());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = ServiceConfig::from_lookup(lookup(&[("DETAILING_TX_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "DETAILING_TX_TIMEOUT_MS"));

        assert!(ServiceConfig::from_lookup(lookup(&[("DETAILING_DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
