//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::FixedOffset;
use thiserror::Error;

/// Placeholder secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SALON_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,
    #[error("invalid bind address '{0}'")]
    InvalidAddr(String),
    #[error("invalid SALON_UTC_OFFSET '{0}', expected e.g. -03:00")]
    InvalidOffset(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// Local offset of the practice.
    pub utc_offset: FixedOffset,
}

impl Config {
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SALON_HOST` | `0.0.0.0` |
    /// | `SALON_PORT` | `3000` |
    /// | `SALON_DB_PATH` | `salon.db` |
    /// | `SALON_JWT_SECRET` | (required) |
    /// | `SALON_UTC_OFFSET` | `-03:00` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = var("SALON_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let host = var("SALON_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("SALON_PORT").unwrap_or_else(|| "3000".into());
        let addr_raw = format!("{}:{}", host, port);
        let addr = addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(addr_raw.clone()))?;

        let db_path = var("SALON_DB_PATH").unwrap_or_else(|| "salon.db".into()).into();

        let offset_raw = var("SALON_UTC_OFFSET").unwrap_or_else(|| "-03:00".into());
        let utc_offset = offset_raw
            .parse::<FixedOffset>()
            .map_err(|_| ConfigError::InvalidOffset(offset_raw.clone()))?;

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
            utc_offset,
        })
    }
}
