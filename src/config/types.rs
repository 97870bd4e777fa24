use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browsing: BrowsingConfig,
    #[serde(default)]
    pub favorites: FavoritesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote catalog endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the catalog API (e.g., "https://api.punkapi.com/v2").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 10).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Trace-log response payloads.
    #[serde(default)]
    pub log_response_data: bool,
    /// Payload bytes to keep when `log_response_data` is on.
    #[serde(default = "default_max_response_log_bytes")]
    pub max_response_log_bytes: usize,
}

/// Retrying of failed network requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Retry cap (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds (default: 1000).
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

/// Listing and search behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsingConfig {
    /// Items requested per page (default: 25).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Quiet period before a search is issued (default: 500).
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Override for the favorites file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_base_url() -> String {
    "https://api.punkapi.com/v2".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    10
}

fn default_max_response_log_bytes() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_page_size() -> usize {
    25
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            log_response_data: false,
            max_response_log_bytes: default_max_response_log_bytes(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for BrowsingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds as u64)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds as u64)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl BrowsingConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl FavoritesConfig {
    /// Favorites file location.
    ///
    /// Uses the configured path, else `punkr/favorites.json` under
    /// `dirs::data_dir()`, falling back to the current directory.
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("punkr")
                .join("favorites.json"),
        }
    }
}
