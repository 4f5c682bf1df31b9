//! # Query Configuration
//!
//! Where the backend lives and how long fetched data stays fresh.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKBOOK_API_URL=https://api.example.com                          │
//! │     STOCKBOOK_STALE_SECS=300                                           │
//! │     STOCKBOOK_RETRIES=1                                                │
//! │     STOCKBOOK_TIMEOUT_SECS=30                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockbook/stockbook.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockbook.stockbook/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:3000, fresh for 5 minutes, 1 retry                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockbook.toml
//! [api]
//! base_url = "http://localhost:3000"
//! timeout_secs = 30
//!
//! [cache]
//! stale_secs = 300
//! retries = 1
//! retry_delay_ms = 250
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{QueryError, QueryResult};
use crate::query::RetryPolicy;

// =============================================================================
// API Settings
// =============================================================================

/// How to reach the REST backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; resource paths (`/products`) are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds). No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Freshness and retry policy of the query cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a fetched value is served without a new request (seconds).
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,

    /// Automatic retries after a failed request.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_stale_secs() -> u64 {
    300
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    250
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            stale_secs: default_stale_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

// =============================================================================
// Main Query Configuration
// =============================================================================

/// Complete query layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl QueryConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockbook.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> QueryResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading query config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load query config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> QueryResult<()> {
        self.base_url()?;

        if self.api.timeout_secs == Some(0) {
            return Err(QueryError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("STOCKBOOK_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(secs) = var("STOCKBOOK_STALE_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.cache.stale_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid STOCKBOOK_STALE_SECS"),
            }
        }

        if let Some(retries) = var("STOCKBOOK_RETRIES") {
            match retries.parse::<u32>() {
                Ok(r) => self.cache.retries = r,
                Err(_) => warn!(value = %retries, "Ignoring invalid STOCKBOOK_RETRIES"),
            }
        }

        if let Some(secs) = var("STOCKBOOK_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.timeout_secs = Some(s),
                Err(_) => warn!(value = %secs, "Ignoring invalid STOCKBOOK_TIMEOUT_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockbook", "stockbook")
            .map(|dirs| dirs.config_dir().join("stockbook.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parses the base URL, accepting only http and https.
    pub fn base_url(&self) -> QueryResult<Url> {
        let url = Url::parse(&self.api.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(QueryError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got scheme: {}",
                other
            ))),
        }
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache.stale_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.cache.retries,
            initial_delay: Duration::from_millis(self.cache.retry_delay_ms),
        }
    }
}
