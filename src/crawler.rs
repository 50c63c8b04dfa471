//! # News Crawler Module
//!
//! This module turns topic searches into article records. It resolves each
//! planned search page to article links, fetches every link once, extracts
//! the article fields and hands the result to the identity engine.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Configuration for a harvest run (topics, window, pacing, paths)
//! - `LinkResolver` / `DocumentFetcher`: The two capabilities the crawl depends on
//! - `HttpFetcher`: `reqwest` + `scraper` implementation of both capabilities
//! - `Pacer`: Fixed-interval rate limiter shared by every outbound request
//! - `Orchestrator`: Per-topic crawl with failure isolation
//!
//! ## Failure Policy
//!
//! Search pages and documents that cannot be fetched are logged and
//! skipped. A topic whose search pages all fail is skipped. None of these
//! end a run.

mod config;
mod content_extraction;
mod error;
mod http;
mod orchestrator;
mod pacing;
mod source;

pub use config::{CrawlerConfig, CrawlerConfigBuilder, DEFAULT_TOPICS};
pub use content_extraction::{
    extract_document, extract_links, media_name, normalize_date, to_record,
};
pub use error::CrawlError;
pub use http::HttpFetcher;
pub use orchestrator::{CrawlStats, Orchestrator};
pub use pacing::Pacer;
pub use source::{DocumentFetcher, LinkResolver};

#[cfg(test)]
pub(crate) use orchestrator::tests as fakes;

use serde::{Deserialize, Serialize};

/// An article as fetched, before any record policy is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// URL the article was fetched from
    pub url: String,

    /// First heading, or the page title
    pub title: Option<String>,

    /// Best available publish date text, unparsed
    pub published: Option<String>,

    /// Paragraph text joined with blank lines
    pub body: String,
}
