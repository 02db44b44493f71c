use config::Config;
use harbour_common::configuration::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

pub const CONFIG_SECTION_CRAWLER: &str = "crawler";

/// Largest page the remote service will return
pub const MAX_ROWS_PER_PAGE: u32 = 100;

/// Crawler settings (from the `[crawler]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Host name, or a base URL including its scheme
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,
    #[serde(default = "defaults::method")]
    pub method: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "defaults::rows_per_page")]
    pub rows_per_page: u32,
    #[serde(default = "defaults::request_interval_ms")]
    pub request_interval_ms: u64,
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,
    /// How many times a crawl interrupted by a transport error is resumed
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            method: defaults::method(),
            api_key: String::new(),
            rows_per_page: defaults::rows_per_page(),
            request_interval_ms: defaults::request_interval_ms(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_attempts: defaults::max_attempts(),
        }
    }
}

mod defaults {
    pub fn endpoint() -> String {
        "datahighway.api.subscan.io".to_string()
    }
    pub fn method() -> String {
        "api/scan/accounts".to_string()
    }
    pub fn rows_per_page() -> u32 {
        super::MAX_ROWS_PER_PAGE
    }
    pub fn request_interval_ms() -> u64 {
        3000
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn connect_timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        1
    }
}

impl CrawlerConfig {
    pub fn try_load(config: &Config) -> Result<Self, ConfigError> {
        let cfg = match config.get::<Self>(CONFIG_SECTION_CRAWLER) {
            Ok(cfg) => cfg,
            Err(config::ConfigError::NotFound(_)) => Self::default(),
            Err(e) => return Err(e.into()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "crawler.endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if self.rows_per_page == 0 || self.rows_per_page > MAX_ROWS_PER_PAGE {
            return Err(ConfigError::Invalid {
                key: "crawler.rows_per_page",
                reason: format!("{} is outside 1..={MAX_ROWS_PER_PAGE}", self.rows_per_page),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "crawler.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.api_key.is_empty() {
            warn!("No API key configured, requests may be throttled harder");
        }
        Ok(())
    }

    /// Full URL of the collection method
    pub fn url(&self) -> String {
        let host = self.endpoint.trim_end_matches('/');
        let method = self.method.trim_start_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/{method}")
        } else {
            format!("https://{host}/{method}")
        }
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}
