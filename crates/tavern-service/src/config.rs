//! Application configuration.
//!
//! Configuration is loaded from `TAVERN_*` environment variables with
//! fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use tavern_core::validation::validate_currency;
use tavern_core::DEFAULT_CURRENCY;
use tavern_db::DbConfig;

/// Default tracing filter when `TAVERN_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tavern=debug,sqlx=warn";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file, or `:memory:`
    pub db_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// tracing-subscriber filter directive
    pub log_filter: String,

    /// Currency for new establishments and accounts when none is given
    pub default_currency: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AppConfig {
            db_path: lookup("TAVERN_DB_PATH")
                .unwrap_or_else(|| "tavern.db".to_string())
                .into(),

            db_max_connections: lookup("TAVERN_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TAVERN_DB_MAX_CONNECTIONS".to_string()))?,

            log_filter: lookup("TAVERN_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),

            default_currency: lookup("TAVERN_DEFAULT_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("TAVERN_DB_MAX_CONNECTIONS".to_string()));
        }

        if validate_currency(&config.default_currency).is_err() {
            return Err(ConfigError::InvalidValue("TAVERN_DEFAULT_CURRENCY".to_string()));
        }

        Ok(config)
    }

    /// Pool settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        if self.db_path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }

        DbConfig::new(self.db_path.clone()).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
