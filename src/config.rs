// config.rs
// Process configuration read from the environment (after dotenv).

use std::{env, net::SocketAddr};

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Origin of the accounting API, without a trailing slash.
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub session_ttl_seconds: u64,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let session_ttl_seconds = match lookup("SESSION_TTL_SECONDS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SESSION_TTL_SECONDS",
                value: raw.clone(),
            })?,
            None => DEFAULT_SESSION_TTL_SECONDS,
        };

        let log_filter = lookup("LOG_FILTER").unwrap_or_else(|| "info".to_string());

        Ok(AppConfig {
            api_base_url,
            bind_addr,
            session_ttl_seconds,
            log_filter,
        })
    }

    /// Configuration pointing at `api_base_url` with every other value defaulted.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        AppConfig {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            log_filter: "info".to_string(),
        }
    }
}
