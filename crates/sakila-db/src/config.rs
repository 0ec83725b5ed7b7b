//! Store configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                     | Default      |
//! |------------------------------|--------------|
//! | `SAKILA_DB_PATH`             | `sakila.db`  |
//! | `SAKILA_DB_MAX_CONNECTIONS`  | `5`          |
//! | `SAKILA_DB_BUSY_TIMEOUT_MS`  | `5000`       |
//! | `SAKILA_PAGE_SIZE`           | `10`         |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sakila_core::{PageRequest, ValidationError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

use crate::pool::DbConfig;

/// Rental store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a statement waits on a locked database before giving up
    pub busy_timeout_ms: u64,

    /// Page size for listings when the caller does not choose one
    pub page_size: u32,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = StoreConfig {
            database_path: lookup("SAKILA_DB_PATH")
                .unwrap_or_else(|| "sakila.db".to_string())
                .into(),

            max_connections: lookup("SAKILA_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SAKILA_DB_MAX_CONNECTIONS".to_string()))?,

            busy_timeout_ms: lookup("SAKILA_DB_BUSY_TIMEOUT_MS")
                .unwrap_or_else(|| "5000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SAKILA_DB_BUSY_TIMEOUT_MS".to_string()))?,

            page_size: lookup("SAKILA_PAGE_SIZE")
                .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SAKILA_PAGE_SIZE".to_string()))?,
        };

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("SAKILA_DB_PATH".to_string()));
        }
        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SAKILA_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue("SAKILA_PAGE_SIZE".to_string()));
        }

        Ok(config)
    }

    /// Pool configuration for this store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    /// Page `page` of a listing at the configured page size.
    pub fn page_request(&self, page: u32) -> Result<PageRequest, ValidationError> {
        PageRequest::new(page, self.page_size)
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

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("sakila.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SAKILA_DB_PATH", "/var/lib/sakila/store.db"),
            ("SAKILA_DB_MAX_CONNECTIONS", "8"),
            ("SAKILA_DB_BUSY_TIMEOUT_MS", "250"),
            ("SAKILA_PAGE_SIZE", "25"),
        ])
        .unwrap();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.page_size, 25);

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/var/lib/sakila/store.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(250));

        let page = config.page_request(3).unwrap();
        assert_eq!(page.page_size(), 25);
        assert_eq!(page.offset(), 50);
        assert!(config.page_request(0).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SAKILA_DB_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(load(&[("SAKILA_DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(load(&[("SAKILA_PAGE_SIZE", "1000")]).is_err());
        assert!(matches!(
            load(&[("SAKILA_DB_PATH", "")]),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
