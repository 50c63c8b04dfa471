//! Collaborator capabilities the orchestrator depends on

use std::future::Future;

use crate::crawler::RawDocument;
use crate::crawler::error::CrawlError;
use crate::planner::SearchRequest;

/// Turns one search result page into the article links it contains
pub trait LinkResolver {
    /// Resolve a search request to absolute article URLs
    ///
    /// Links back to the search engine itself and its settings or policy
    /// pages are never returned.
    fn resolve_links(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<String>, CrawlError>>;
}

/// Fetches and parses a single article
pub trait DocumentFetcher {
    /// Fetch `url` and extract its title, publish date and body text
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<RawDocument, CrawlError>>;
}
