//! # Configuration Module
//!
//! This module defines the runtime configuration of the service: where to
//! listen, which database to use, how to log and how to retry the initial
//! database connection. Values come from the process environment, which
//! `main` first populates from a `.env` file when one exists.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

// Defaults
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {other}")),
        }
    }
}

/// Retry configuration for the initial database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first failure
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 500,  // 0.5 seconds
            max_retry_delay_ms: 5000, // 5 seconds
        }
    }
}

impl RetryConfig {
    /// Exponential backoff for the given retry attempt (0-based), capped
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay_ms = self
            .base_retry_delay_ms
            .saturating_mul(factor)
            .min(self.max_retry_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Pool size
    pub max_connections: u32,
    /// Connection retry behaviour
    pub retry: RetryConfig,
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    pub server_addr: String,
    /// `None` selects the in-memory stores
    pub database: Option<DatabaseConfig>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse().context("Invalid LOG_FORMAT")?,
            None => LogFormat::Text,
        };

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                let defaults = RetryConfig::default();
                Some(DatabaseConfig {
                    url,
                    max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
                    retry: RetryConfig {
                        max_retries: parse_or(&lookup, "DB_MAX_RETRIES", defaults.max_retries)?,
                        base_retry_delay_ms: parse_or(
                            &lookup,
                            "DB_BASE_RETRY_DELAY_MS",
                            defaults.base_retry_delay_ms,
                        )?,
                        max_retry_delay_ms: parse_or(
                            &lookup,
                            "DB_MAX_RETRY_DELAY_MS",
                            defaults.max_retry_delay_ms,
                        )?,
                    },
                })
            }
            None => None,
        };

        Ok(Self {
            server_addr,
            database,
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {value}")),
        None => Ok(default),
    }
}
