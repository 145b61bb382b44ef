//! Runtime configuration read from the environment.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:viviendas.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    /// Endpoint receiving state change notifications; None disables them
    pub notify_url: Option<String>,
    pub notify_token: Option<String>,
    pub notify_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, used by `from_env` and tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 127.0.0.1:3000")?;

        let notify_timeout_secs = match non_empty("NOTIFY_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("NOTIFY_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_NOTIFY_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            cors_origin: non_empty("CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            notify_url: non_empty("NOTIFY_URL"),
            notify_token: non_empty("NOTIFY_TOKEN"),
            notify_timeout: Duration::from_secs(notify_timeout_secs),
        })
    }
}
