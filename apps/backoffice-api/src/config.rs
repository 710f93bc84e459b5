//! Back office API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Back office API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Where uploaded product images are written
    pub storage_dir: PathBuf,

    /// Role given to self-registered users
    pub default_role_id: i64,

    /// Adds `Secure` to the session cookie
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_var("HTTP_PORT", "8000")?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/tally.db".to_string())
                .into(),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "tally-dev-secret-change-in-production".to_string()),

            jwt_lifetime_secs: parse_var("JWT_LIFETIME_SECS", "86400")?, // 24 hours

            storage_dir: env::var("STORAGE_DIR")
                .unwrap_or_else(|_| "./data/uploads".to_string())
                .into(),

            default_role_id: parse_var("DEFAULT_ROLE_ID", "2")?,

            cookie_secure: parse_var("COOKIE_SECURE", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.default_role_id <= 0 {
            return Err(ConfigError::InvalidValue("DEFAULT_ROLE_ID".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
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

    #[test]
    fn test_parse_var_default_and_bad_value() {
        let port: u16 = parse_var("TALLY_TEST_UNSET_PORT", "8000").unwrap();
        assert_eq!(port, 8000);

        let err = parse_var::<u16>("TALLY_TEST_UNSET_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "TALLY_TEST_UNSET_PORT"));
    }

    #[test]
    fn test_validate_rejects_blank_secret() {
        let config = ApiConfig {
            http_port: 8000,
            database_path: "./x.db".into(),
            db_max_connections: 5,
            jwt_secret: "  ".to_string(),
            jwt_lifetime_secs: 60,
            storage_dir: "./uploads".into(),
            default_role_id: 2,
            cookie_secure: false,
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }
}
