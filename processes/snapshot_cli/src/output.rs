//! Output location and file naming

use chrono::NaiveDateTime;
use config::Config;
use harbour_module_account_crawler::CrawlerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_SECTION_OUTPUT: &str = "output";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M-%f";

/// Output settings (from the `[output]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl OutputConfig {
    pub fn try_load(config: &Config) -> Result<Self, config::ConfigError> {
        match config.get::<Self>(CONFIG_SECTION_OUTPUT) {
            Ok(cfg) => Ok(cfg),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// `{endpoint}-{method}-{timestamp}.json`
    pub fn raw_dump_path(&self, crawler: &CrawlerConfig, at: &NaiveDateTime) -> PathBuf {
        let endpoint = crawler
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .replace('/', "-");
        let method = crawler.method.trim_matches('/').replace('/', "-").to_lowercase();
        self.data_dir.join(format!("{endpoint}-{method}-{}.json", timestamp(at)))
    }

    /// `{source}-{timestamp}-genesis-fixture.json`
    pub fn genesis_path(&self, source: &Path, at: &NaiveDateTime) -> PathBuf {
        self.derived_path(source, at, "genesis-fixture")
    }

    /// `{source}-{timestamp}-genesis-fixture-converted.json`
    pub fn converted_path(&self, source: &Path, at: &NaiveDateTime) -> PathBuf {
        self.derived_path(source, at, "genesis-fixture-converted")
    }

    fn derived_path(&self, source: &Path, at: &NaiveDateTime, suffix: &str) -> PathBuf {
        let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        self.data_dir.join(format!("{stem}-{}-{suffix}.json", timestamp(at)))
    }
}

pub fn timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
