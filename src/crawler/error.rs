//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
///
/// Every variant is a transport or parsing failure for a single search page
/// or document. The orchestrator logs these and moves on.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("Timed out fetching {0}")]
    Timeout(String),

    /// The server answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CrawlError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CrawlError::Timeout(_) => true,
            CrawlError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            CrawlError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::UrlParse(e) => CrateError::Other(format!("URL parse error: {}", e)),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let throttled = CrawlError::Status {
            url: "https://news.example/a".to_string(),
            status: 429,
        };
        let unavailable = CrawlError::Status {
            url: "https://news.example/a".to_string(),
            status: 503,
        };
        let missing = CrawlError::Status {
            url: "https://news.example/a".to_string(),
            status: 404,
        };

        assert!(throttled.is_transient());
        assert!(unavailable.is_transient());
        assert!(!missing.is_transient());
        assert!(CrawlError::Timeout("https://news.example/a".to_string()).is_transient());
        assert!(!CrawlError::HtmlParse("bad".to_string()).is_transient());
    }

    #[test]
    fn test_conversion_to_crate_error() {
        let err: CrateError = CrawlError::Timeout("https://news.example/a".to_string()).into();
        assert!(matches!(err, CrateError::Crawl(msg) if msg.contains("news.example")));
    }
}
