//! # newsharvest - Incremental News Search Harvester
//!
//! This crate collects news articles for a catalogue of search topics over a
//! trailing date window and accumulates them into a spreadsheet dataset.
//! Repeated runs only add articles that have not been collected before.
//!
//! ## Features
//!
//! - Date-windowed, paginated news search per topic
//! - Polite crawling with a shared request pacer and optional bounded fan-out
//! - Content-level deduplication via normalized fingerprints persisted across runs
//! - URL-keyed merge into an `.xlsx` dataset with atomic file replacement
//! - Per-page and per-document failure isolation
//! - Async API with Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use newsharvest::crawler::{CrawlerConfig, HttpFetcher};
//! use newsharvest::dataset::XlsxStore;
//! use newsharvest::planner::DateWindow;
//! use newsharvest::runner::RunController;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlerConfig::builder()
//!         .topics(["electric scooter crash"])
//!         .pages_per_topic(2)
//!         .build();
//!
//!     let fetcher = HttpFetcher::new(&config)?;
//!     let dataset = XlsxStore::new(&config.output_path);
//!     let window = DateWindow::ending_today(config.years_to_search);
//!
//!     let summary = RunController::new(&config, &fetcher, &fetcher, &dataset)
//!         .run(window)
//!         .await?;
//!
//!     println!("Collected {} new articles", summary.new_records);
//!     Ok(())
//! }
//! ```

mod error;
mod persist;

pub mod crawler;
pub mod dataset;
pub mod identity;
pub mod planner;
pub mod runner;

pub use error::{Error, Result};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::crawler::{CrawlStats, CrawlerConfig, HttpFetcher};
    pub use crate::dataset::{DatasetStore, Record, XlsxStore};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::planner::DateWindow;
    pub use crate::runner::{RunController, RunSummary};
}
