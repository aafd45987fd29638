//! Type-Safe Configuration with Validation
//!
//! Reads the environment (after loading a `.env` file if one exists) into a
//! validated [`Config`]. Values are read through a lookup function so tests
//! can supply their own environment.

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Development-only signing secret used when `JWT_SECRET` is unset.
pub const DEFAULT_JWT_SECRET: &str = "library-service-development-secret";

/// Default issuer written into and required from every token.
pub const DEFAULT_ISSUER: &str = "library-service";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable that held the URL
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Invalid TTL value
    #[error("Invalid TTL: must be greater than 0")]
    InvalidTtl,

    /// A duration that must be positive was zero
    #[error("Invalid {0}: must be greater than 0")]
    InvalidDuration(&'static str),

    /// Invalid pool size
    #[error("Invalid pool size: must be greater than 0")]
    InvalidPoolSize,

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: Url,
    /// Upper bound on pooled connections
    pub db_max_connections: u32,
    /// Bound on every store access, also used as the pool acquire timeout
    pub store_timeout: Duration,
    /// Drop all tables before migrations run
    pub clear_db_on_startup: bool,
    /// HS256 signing secret
    pub jwt_secret: String,
    /// True when `jwt_secret` is the development fallback
    pub jwt_secret_is_default: bool,
    /// Token issuer
    pub jwt_issuer: String,
    /// Token lifetime
    pub token_ttl: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Log filter directive
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable fails to parse or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable fails to parse or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (jwt_secret, jwt_secret_is_default) = match lookup("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEFAULT_JWT_SECRET.to_string(), true),
        };

        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env(&lookup, "PORT", 50051)?,
            database_url: database_url(&lookup)?,
            db_max_connections: parse_env(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            store_timeout: Duration::from_secs(parse_env(&lookup, "STORE_TIMEOUT", 5)?),
            clear_db_on_startup: parse_env(&lookup, "CLEAR_DB_ON_STARTUP", false)?,
            jwt_secret,
            jwt_secret_is_default,
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            token_ttl: Duration::from_secs(parse_env(&lookup, "TOKEN_TTL", 86_400)?),
            shutdown_timeout: Duration::from_secs(parse_env(&lookup, "SHUTDOWN_TIMEOUT", 30)?),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_env(&lookup, "LOG_JSON", false)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::InvalidTtl);
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration("STORE_TIMEOUT"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::InvalidDuration("SHUTDOWN_TIMEOUT"));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_issuer.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_ISSUER".to_string()));
        }
        Ok(())
    }

    /// Socket address string the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a variable with a default value.
fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the `DB_*` parts.
fn database_url<F>(lookup: &F) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("DATABASE_URL") {
        return parse_url("DATABASE_URL", &raw);
    }

    let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port: u16 = parse_env(lookup, "DB_PORT", 5432)?;
    let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
    let password = lookup("DB_PASSWORD").unwrap_or_default();
    let name = lookup("DB_NAME").unwrap_or_else(|| "library".to_string());

    let mut url = parse_url("DB_HOST", &format!("postgres://{host}:{port}/{name}"))?;
    let invalid = |field: &str| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: "cannot be encoded into a connection URL".to_string(),
    };
    url.set_username(&user).map_err(|()| invalid("DB_USER"))?;
    if !password.is_empty() {
        url.set_password(Some(&password))
            .map_err(|()| invalid("DB_PASSWORD"))?;
    }
    Ok(url)
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 50051);
        assert_eq!(config.jwt_issuer, "library-service");
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert!(config.jwt_secret_is_default);
        assert!(!config.clear_db_on_startup);
        assert_eq!(config.database_url.scheme(), "postgres");
    }

    #[test]
    fn test_database_url_from_parts() {
        let config = Config::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "librarian"),
            ("DB_PASSWORD", "p@ss"),
            ("DB_NAME", "catalog"),
        ]))
        .unwrap();

        let url = &config.database_url;
        assert_eq!(url.host_str(), Some("db.internal"));
        assert_eq!(url.port(), Some(6543));
        assert_eq!(url.username(), "librarian");
        assert_eq!(url.path(), "/catalog");
        assert!(url.password().is_some());
    }

    #[test]
    fn test_database_url_wins_over_parts() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://u@primary:5432/books"),
            ("DB_HOST", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.host_str(), Some("primary"));
    }

    #[test]
    fn test_invalid_database_url() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_config_validation_invalid_port() {
        let result = Config::from_lookup(lookup_from(&[("PORT", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidPort)));
    }

    #[test]
    fn test_config_validation_zero_ttl() {
        let result = Config::from_lookup(lookup_from(&[("TOKEN_TTL", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidTtl)));
    }

    #[test]
    fn test_config_validation_zero_store_timeout() {
        let result = Config::from_lookup(lookup_from(&[("STORE_TIMEOUT", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration("STORE_TIMEOUT"))
        ));
    }

    #[test]
    fn test_config_validation_empty_secret() {
        let result = Config::from_lookup(lookup_from(&[("JWT_SECRET", "")]));
        assert!(matches!(result, Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_unparseable_value() {
        let result = Config::from_lookup(lookup_from(&[("CLEAR_DB_ON_STARTUP", "maybe")]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_explicit_secret_is_not_default() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cr3t")])).unwrap();
        assert!(!config.jwt_secret_is_default);
        assert_eq!(config.bind_address(), "0.0.0.0:50051");
    }
}
