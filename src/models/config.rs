//! Application configuration structures.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage RPC endpoint settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Feed polling behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Full-text index settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Outbound RSS document settings
    #[serde(default)]
    pub rss: RssConfig,

    /// Listen addresses of the service surfaces
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override values from `SYNDICATE_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("SYNDICATE_STORAGE_URL") {
            self.storage.base_url = url;
        }
        if let Ok(path) = env::var("SYNDICATE_INDEX_PATH") {
            self.search.index_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Ok(secs) = env::var("SYNDICATE_POLL_INTERVAL_SECS") {
            self.crawler.poll_interval_secs = secs.parse().map_err(|e| {
                AppError::config(format!("SYNDICATE_POLL_INTERVAL_SECS={secs}: {e}"))
            })?;
        }
        if let Ok(hostname) = env::var("SYNDICATE_HOSTNAME") {
            self.rss.hostname = hostname;
        }
        if let Ok(level) = env::var("SYNDICATE_LOG") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.storage.base_url.trim().is_empty() {
            return Err(AppError::validation("storage.base_url is empty"));
        }
        url::Url::parse(&self.storage.base_url)?;
        if self.storage.timeout_secs == 0 {
            return Err(AppError::validation("storage.timeout_secs must be > 0"));
        }
        if self.storage.bulk_timeout_secs == 0 {
            return Err(AppError::validation(
                "storage.bulk_timeout_secs must be > 0",
            ));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.poll_interval_secs == 0 {
            return Err(AppError::validation(
                "crawler.poll_interval_secs must be > 0",
            ));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.search.max_results == 0 {
            return Err(AppError::validation("search.max_results must be > 0"));
        }
        if self.rss.hostname.trim().is_empty() {
            return Err(AppError::validation("rss.hostname is empty"));
        }
        Ok(())
    }
}

/// Storage RPC client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage service
    #[serde(default = "defaults::storage_url")]
    pub base_url: String,

    /// Timeout for point lookups and inserts, in seconds
    #[serde(default = "defaults::storage_timeout")]
    pub timeout_secs: u64,

    /// Timeout for bulk post listings, in seconds
    #[serde(default = "defaults::storage_bulk_timeout")]
    pub bulk_timeout_secs: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bulk_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::storage_url(),
            timeout_secs: defaults::storage_timeout(),
            bulk_timeout_secs: defaults::storage_bulk_timeout(),
        }
    }
}

/// HTTP client and polling settings for external feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for feed requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Feed request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Seconds between scheduled polls
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum feeds fetched at once within a poll
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl CrawlerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            poll_interval_secs: defaults::poll_interval(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Full-text index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Where the index is persisted; memory only when absent
    #[serde(default)]
    pub index_path: Option<PathBuf>,

    /// Maximum hits per query
    #[serde(default = "defaults::max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            max_results: defaults::max_results(),
        }
    }
}

/// Outbound RSS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssConfig {
    /// Public base URL used in item links
    #[serde(default = "defaults::hostname")]
    pub hostname: String,

    /// Name used in channel titles
    #[serde(default = "defaults::site_name")]
    pub site_name: String,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            hostname: defaults::hostname(),
            site_name: defaults::site_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::search_addr")]
    pub search_addr: String,
    #[serde(default = "defaults::rss_addr")]
    pub rss_addr: String,
    #[serde(default = "defaults::crawler_addr")]
    pub crawler_addr: String,
    #[serde(default = "defaults::feed_addr")]
    pub feed_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            search_addr: defaults::search_addr(),
            rss_addr: defaults::rss_addr(),
            crawler_addr: defaults::crawler_addr(),
            feed_addr: defaults::feed_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info` or `debug`
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Storage defaults
    pub fn storage_url() -> String {
        "http://127.0.0.1:1798".into()
    }
    pub fn storage_timeout() -> u64 {
        2
    }
    pub fn storage_bulk_timeout() -> u64 {
        10
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; syndicate/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn poll_interval() -> u64 {
        300
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Search defaults
    pub fn max_results() -> usize {
        50
    }

    // RSS defaults
    pub fn hostname() -> String {
        "http://localhost:1916".into()
    }
    pub fn site_name() -> String {
        "Rabble".into()
    }

    // Server defaults
    pub fn search_addr() -> String {
        "0.0.0.0:1886".into()
    }
    pub fn rss_addr() -> String {
        "0.0.0.0:1973".into()
    }
    pub fn crawler_addr() -> String {
        "0.0.0.0:1974".into()
    }
    pub fn feed_addr() -> String {
        "0.0.0.0:2012".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
