//! Service configuration, loaded from the environment at startup.

use std::env;
use std::net::{IpAddr, SocketAddr};

use tracing::debug;

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_JWT_SECRET: &str = "dev-only-secret";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const MAX_TOKEN_TTL_HOURS: i64 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip = host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidConfig(format!("Invalid HOST '{}': {}", host, e)))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidConfig(format!("Invalid PORT '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.trim().is_empty() => {
                return Err(ConfigError::InvalidConfig("JWT_SECRET can not be empty".to_string()));
            }
            Some(secret) => secret,
            None => DEFAULT_JWT_SECRET.to_string(),
        };

        let token_ttl_hours = match lookup("JWT_TTL_HOURS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| {
                ConfigError::InvalidConfig(format!("Invalid JWT_TTL_HOURS '{}': {}", raw, e))
            })?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::InvalidConfig(format!(
                "JWT_TTL_HOURS must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }

        let log_format = match lookup("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidConfig(format!(
                    "Invalid LOG_FORMAT '{}', expected 'pretty' or 'json'",
                    other
                )));
            }
        };

        let config = AppConfig {
            bind_addr: SocketAddr::new(ip, port),
            jwt_secret,
            token_ttl_hours,
            log_format,
        };
        debug!(
            bind_addr = %config.bind_addr,
            token_ttl_hours = config.token_ttl_hours,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}
