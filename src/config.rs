//! Configuration for holdboard.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Lower bound for the per-attempt Reddit timeout.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Upper bound for the per-attempt Reddit timeout.
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 7_000;

/// How an `unavailable` verification result is treated on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Reject the submission.
    #[default]
    Strict,
    /// Log a warning and accept the submission.
    Soft,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Enables the development-only audit endpoint.
    #[serde(default)]
    pub dev_mode: bool,

    /// JSON snapshot file for entries. Entries live only in memory when unset.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Reddit verification configuration.
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Market quote configuration.
    #[serde(default)]
    pub market: MarketConfig,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Reddit verification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// OAuth client id. The OAuth path is disabled without it.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret. The OAuth path is disabled without it.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// User-Agent sent on every Reddit request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Strict or soft handling of `unavailable` results.
    #[serde(default)]
    pub check_mode: CheckMode,

    /// Per-attempt request timeout in milliseconds, clamped to
    /// `MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS` when read.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Extra attempts after the first on network failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Linear backoff step in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

/// Market quote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Ticker symbol.
    #[serde(default = "default_emiten")]
    pub emiten: String,

    /// Exchange code.
    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Seconds a fetched snapshot stays fresh.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Disable scraping entirely (snapshot is always unavailable).
    #[serde(default)]
    pub disabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            dev_mode: false,
            data_file: None,
            reddit: RedditConfig::default(),
            market: MarketConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: default_user_agent(),
            check_mode: CheckMode::default(),
            request_timeout_ms: default_request_timeout_ms(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            emiten: default_emiten(),
            exchange: default_exchange(),
            cache_ttl_secs: default_cache_ttl(),
            disabled: false,
        }
    }
}

impl RedditConfig {
    /// Returns the client credentials when both halves are present and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let secret = self
            .client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((id, secret))
    }

    /// Per-attempt timeout as a [`Duration`], kept within 5 to 7 seconds.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS),
        )
    }
}

impl MarketConfig {
    /// Snapshot freshness as a [`Duration`].
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_agent() -> String {
    "LeaderboardHolder/1.0".to_string()
}

const fn default_request_timeout_ms() -> u64 {
    6_000
}

const fn default_retries() -> u32 {
    2
}

const fn default_backoff_ms() -> u64 {
    250
}

fn default_emiten() -> String {
    "BUMI".to_string()
}

fn default_exchange() -> String {
    "IDX".to_string()
}

const fn default_cache_ttl() -> u64 {
    60
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
