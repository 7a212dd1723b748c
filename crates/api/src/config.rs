//! Process configuration, read once from the environment at startup.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BIND_ADDR` | `0.0.0.0:8080` | listen address |
//! | `PUBLIC_BASE_URL` | unset | base for report URLs; unset = derive from the request |
//! | `DATABASE_URL` | unset | Postgres store; unset = in-memory store |
//! | `REDIS_URL` | unset | Redis queue (feature `redis`); unset = in-process worker |
//! | `REDIS_QUEUE_KEY` | `storewatch:reports` | Redis list key |
//! | `REPORT_QUEUE_CAPACITY` | `256` | in-process queue bound |
//!
//! Empty values count as unset.

use std::net::SocketAddr;

use thiserror::Error;

use storewatch_core::BaseUrl;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_REDIS_QUEUE_KEY: &str = "storewatch:reports";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub public_base_url: Option<BaseUrl>,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub redis_queue_key: String,
    pub queue_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            public_base_url: None,
            database_url: None,
            redis_url: None,
            redis_queue_key: DEFAULT_REDIS_QUEUE_KEY.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|raw| BaseUrl::parse(&raw))
            .transpose()
            .map_err(|e| ConfigError::Invalid {
                key: "PUBLIC_BASE_URL",
                reason: e.to_string(),
            })?;

        let queue_capacity = match get("REPORT_QUEUE_CAPACITY") {
            None => DEFAULT_QUEUE_CAPACITY,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        key: "REPORT_QUEUE_CAPACITY",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "REPORT_QUEUE_CAPACITY",
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            bind_addr,
            public_base_url,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            redis_queue_key: get("REDIS_QUEUE_KEY").unwrap_or_else(|| DEFAULT_REDIS_QUEUE_KEY.to_string()),
            queue_capacity,
        })
    }
}
