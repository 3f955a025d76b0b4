//! Console configuration, read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Base URL of the backend API, without trailing slash.
    pub backend_url: String,
    /// Optional JSON permission table replacing the built-in one.
    pub permissions_file: Option<PathBuf>,
    pub backend_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            backend_url: "http://localhost:5000".to_string(),
            permissions_file: None,
            backend_timeout: Duration::from_secs(30),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: addr.clone(),
            })?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(url) = lookup("BACKEND_API_URL") {
            let url = url.trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "BACKEND_API_URL",
                    value: url,
                });
            }
            config.backend_url = url;
        }

        config.permissions_file = lookup("PERMISSIONS_FILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        if let Some(secs) = lookup("BACKEND_TIMEOUT_SECS") {
            let parsed: u64 = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BACKEND_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.backend_timeout = Duration::from_secs(parsed);
        }

        Ok(config)
    }
}
