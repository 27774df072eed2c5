//! Queue and store backend configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, DEFAULT_NAMESPACE};

/// Environment variable holding the queue name.
pub const ENV_QUEUE_NAME: &str = "QUEUIFY_QUEUE_NAME";
/// Environment variable holding the queue capacity.
pub const ENV_MAXSIZE: &str = "QUEUIFY_MAXSIZE";
/// Environment variable holding the key namespace.
pub const ENV_NAMESPACE: &str = "QUEUIFY_NAMESPACE";
/// Environment variable holding the Redis URL; absent selects the in-memory store.
pub const ENV_REDIS_URL: &str = "QUEUIFY_REDIS_URL";

/// Store backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-process store for development/testing.
    InMemory,
    /// Redis or Redis-compatible server.
    Redis {
        /// Connection URL (`redis://`, `rediss://` or `unix://`).
        url: String,
    },
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Logical queue name.
    pub name: String,
    /// Capacity; `<= 0` means unbounded.
    #[serde(default)]
    pub maxsize: i64,
    /// Prefix for every store key of the queue.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Store backend selection.
    pub store: StoreBackendConfig,
}

impl QueueConfig {
    /// Configuration for an in-memory queue under the default namespace.
    pub fn in_memory(name: impl Into<String>, maxsize: i64) -> Self {
        Self {
            name: name.into(),
            maxsize,
            namespace: default_namespace(),
            store: StoreBackendConfig::InMemory,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".into());
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(format!("name `{}` must not contain whitespace", self.name));
        }
        if let StoreBackendConfig::Redis { url } = &self.store {
            let scheme = url.split_once("://").map(|(scheme, _)| scheme);
            if !matches!(scheme, Some("redis" | "rediss" | "unix")) {
                return Err(format!("unsupported redis url `{url}`"));
            }
        }
        Ok(())
    }

    /// Parse queue configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();

        let name = std::env::var(ENV_QUEUE_NAME)
            .with_context(|| format!("{ENV_QUEUE_NAME} is not set"))?;
        let maxsize = match std::env::var(ENV_MAXSIZE) {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAXSIZE} is not an integer: {raw}"))?,
            Err(_) => 0,
        };
        let namespace = std::env::var(ENV_NAMESPACE).unwrap_or_else(|_| default_namespace());
        let store = match std::env::var(ENV_REDIS_URL) {
            Ok(url) => StoreBackendConfig::Redis { url },
            Err(_) => StoreBackendConfig::InMemory,
        };

        let cfg = Self {
            name,
            maxsize,
            namespace,
            store,
        };
        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("invalid queue configuration from environment")?;
        Ok(cfg)
    }
}
