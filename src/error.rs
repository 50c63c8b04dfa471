//! Error types for the newsharvest crate

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::identity::StoreError;

/// Result type for newsharvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for newsharvest operations
///
/// Only the storage variants and `Other` abort a run. Crawl errors are
/// recovered inside the orchestrator and surface here only when a caller
/// drives the crawler directly.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Fingerprint store could not be read or written
    #[error("Fingerprint store error: {0}")]
    FingerprintStore(#[from] StoreError),

    /// Dataset could not be read or written
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
