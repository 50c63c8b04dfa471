//! # Crawler Configuration Module
//!
//! This module provides configuration options for a harvest run, including
//! the topic catalogue, the lookback window, pacing and the persisted file
//! locations. It uses a builder pattern for programmatic configuration and
//! serde for JSON configuration files.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! ## Features
//!
//! - Defaults reproduce the built-in e-scooter crash news catalogue
//! - Any subset of fields can be overridden from a JSON file
//! - Validation before any network or disk I/O happens

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::MAX_CELL_CHARS;
use crate::error::{Error, Result};
use crate::identity::FingerprintScope;

/// Built-in topic catalogue, searched in this order
pub const DEFAULT_TOPICS: &[&str] = &[
    "e-scooter crash",
    "electric scooter accident",
    "scooter collision",
    "e-scooter injury",
    "scooter fatality",
    "micromobility crash",
    "electric scooter death",
    "e-scooter trauma center",
    "e-scooter hospitalization",
    "scooter head injury",
    "e-scooter spinal injury",
    "electric scooter accident victim",
    "scooter hit by car",
    "e-scooter broken bones",
    "e-scooter hospital admission",
    "e-scooter safety concerns",
    "electric scooter lawsuit",
    "e-scooter regulation",
    "e-scooter public health",
    "scooter accident news",
    "electric scooter danger",
    "micromobility injury statistics",
    "scooter recall news",
    "scooter rental accident",
    "shared scooter crash",
    "e-scooter dui crash",
    "electric scooter police report",
    "scooter traffic citation",
    "scooter rider killed",
    "e-scooter hit and run",
    "fatal scooter collision",
    "e-scooter child injury",
    "scooter elderly crash",
    "e-scooter injuries downtown",
    "campus e-scooter accident",
    "e-scooter school zone crash",
    "e-scooter pedestrian struck",
    "bike lane scooter crash",
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Configuration for a harvest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Search queries, processed in order
    pub topics: Vec<String>,

    /// Length of the lookback window in years
    pub years_to_search: u32,

    /// Number of result pages scanned per topic
    pub pages_per_topic: u32,

    /// Minimum delay in milliseconds between outbound requests
    pub delay_ms: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries for transport failures, with exponential backoff
    pub max_retries: u32,

    /// Number of document fetches allowed in flight at once
    pub fetch_concurrency: usize,

    /// Dataset spreadsheet location
    pub output_path: PathBuf,

    /// Fingerprint store location
    pub fingerprints_path: PathBuf,

    /// User agent sent with every request
    pub user_agent: String,

    /// News search endpoint
    pub search_base_url: String,

    /// Fields that feed article fingerprints
    pub fingerprint_scope: FingerprintScope,

    /// Paragraphs must be longer than this to count as body text
    pub min_block_chars: usize,

    /// Content is truncated to this many characters
    pub max_content_chars: usize,

    /// Content must be longer than this to produce a record
    pub min_content_chars: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            years_to_search: 4,
            pages_per_topic: 5,
            delay_ms: 2000,
            request_timeout_secs: 10,
            max_retries: 0,
            fetch_concurrency: 1,
            output_path: PathBuf::from("escooter_crash_news.xlsx"),
            fingerprints_path: PathBuf::from("fingerprints.json"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_base_url: "https://www.google.com/search".to_string(),
            fingerprint_scope: FingerprintScope::default(),
            min_block_chars: 50,
            max_content_chars: 5000,
            min_content_chars: 50,
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: CrawlerConfig) -> Self {
        Self { config }
    }

    /// Replace the topic catalogue
    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the lookback window length in years
    pub fn years_to_search(mut self, years: u32) -> Self {
        self.config.years_to_search = years;
        self
    }

    /// Set the number of result pages scanned per topic
    pub fn pages_per_topic(mut self, pages: u32) -> Self {
        self.config.pages_per_topic = pages;
        self
    }

    /// Set the delay in milliseconds between requests
    pub fn delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.delay_ms = delay_ms;
        self
    }

    /// Set the per-request timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set the number of retries for transport failures
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the number of concurrent document fetches
    pub fn fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.config.fetch_concurrency = concurrency;
        self
    }

    /// Set the dataset spreadsheet location
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// Set the fingerprint store location
    pub fn fingerprints_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fingerprints_path = path.into();
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the news search endpoint
    pub fn search_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.search_base_url = url.into();
        self
    }

    /// Set which fields feed article fingerprints
    pub fn fingerprint_scope(mut self, scope: FingerprintScope) -> Self {
        self.config.fingerprint_scope = scope;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Read a JSON configuration file; absent fields keep their defaults
    pub fn read_config(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(Error::Config("topic catalogue is empty".to_string()));
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config("topic catalogue contains a blank topic".to_string()));
        }
        if self.pages_per_topic == 0 {
            return Err(Error::Config("pages_per_topic must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be at least 1".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(Error::Config("fetch_concurrency must be at least 1".to_string()));
        }
        if self.max_content_chars <= self.min_content_chars {
            return Err(Error::Config(
                "max_content_chars must exceed min_content_chars".to_string(),
            ));
        }
        if self.max_content_chars > MAX_CELL_CHARS {
            return Err(Error::Config(format!(
                "max_content_chars cannot exceed {}",
                MAX_CELL_CHARS
            )));
        }
        url::Url::parse(&self.search_base_url)
            .map_err(|e| Error::Config(format!("invalid search_base_url: {}", e)))?;
        Ok(())
    }

    /// Get the inter-request delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Get the per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
