// src/config.rs

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::core::validator::{self, DEFAULT_PORTS};
use crate::logging::{PROJECT_NAME, get_data_dir};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
}

/// Settings for the task client and the orchestrator.
///
/// Built once at startup (defaults, then environment, then command-line
/// overrides) and passed down explicitly.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Root of the remote task API. Always ends with `/`.
    pub api_base_url: Url,
    /// Request timeout for `POST {base}/<operation>`.
    pub submit_timeout: Duration,
    /// Request timeout for `GET {base}/task/{id}`.
    pub poll_timeout: Duration,
    /// Pause between two polls of the same task.
    pub poll_interval: Duration,
    /// Wall-clock budget for polling one operation.
    pub operation_budget: Duration,
    /// `timeout` field sent with ping payloads, in seconds.
    pub ping_timeout_secs: u64,
    pub default_ports: String,
    /// How many operations of a batch may be in flight at once. 1 runs them
    /// one after the other.
    pub max_concurrent_operations: usize,
    pub history_path: PathBuf,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            api_base_url: normalize_base(Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid")),
            submit_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
            operation_budget: Duration::from_secs(30),
            ping_timeout_secs: 4,
            default_ports: DEFAULT_PORTS.to_string(),
            max_concurrent_operations: 1,
            history_path: get_data_dir().join("history.jsonl"),
        }
    }
}

impl DispatcherConfig {
    /// Defaults overridden by `<PROJECT>_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let key = env_key(suffix);
            lookup(&key).map(|value| (key, value))
        };
        let mut config = Self::default();

        if let Some((key, value)) = var("API_BASE_URL") {
            config.api_base_url = parse_base_url(&key, &value)?;
        }
        if let Some((key, value)) = var("SUBMIT_TIMEOUT_SECS") {
            config.submit_timeout = Duration::from_secs(parse(&key, &value)?);
        }
        if let Some((key, value)) = var("POLL_TIMEOUT_SECS") {
            config.poll_timeout = Duration::from_secs(parse(&key, &value)?);
        }
        if let Some((key, value)) = var("POLL_INTERVAL_MS") {
            config = config
                .with_poll_interval(Duration::from_millis(parse(&key, &value)?))
                .map_err(|_| invalid(&key, &value))?;
        }
        if let Some((key, value)) = var("OPERATION_BUDGET_SECS") {
            config.operation_budget = Duration::from_secs(parse(&key, &value)?);
        }
        if let Some((key, value)) = var("PING_TIMEOUT_SECS") {
            config.ping_timeout_secs = parse(&key, &value)?;
        }
        if let Some((key, value)) = var("DEFAULT_PORTS") {
            config.default_ports =
                validator::validate_ports(&value, DEFAULT_PORTS).map_err(|_| invalid(&key, &value))?;
        }
        if let Some((key, value)) = var("MAX_CONCURRENCY") {
            config = config.with_max_concurrency(parse(&key, &value)?).map_err(|_| invalid(&key, &value))?;
        }
        if let Some((_, value)) = var("HISTORY_PATH") {
            config.history_path = PathBuf::from(value);
        }

        debug!(?config, "Configuration loaded.");
        Ok(config)
    }

    pub fn with_api_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url("api_base_url", raw)?;
        Ok(self)
    }

    /// A zero interval would poll the task API back to back for the whole
    /// budget, so it is rejected.
    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(invalid("poll_interval", "0"));
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Result<Self, ConfigError> {
        if limit == 0 {
            return Err(invalid("max_concurrent_operations", "0"));
        }
        self.max_concurrent_operations = limit;
        Ok(self)
    }
}

fn env_key(suffix: &str) -> String {
    format!("{}_{}", PROJECT_NAME.as_str(), suffix)
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid { key: key.to_string(), value: value.to_string() }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|_| invalid(key, value))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(key, value));
    }
    Ok(normalize_base(url))
}

// Url::join drops the last path segment unless the base ends with '/'.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
