//! Per-topic crawl: search pages, link union, document fetches, identity filter

use std::collections::HashSet;
use std::future::Future;
use std::ops::AddAssign;
use std::pin::pin;
use std::time::Duration;

use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::crawler::content_extraction::to_record;
use crate::crawler::error::CrawlError;
use crate::crawler::pacing::Pacer;
use crate::crawler::source::{DocumentFetcher, LinkResolver};
use crate::crawler::CrawlerConfig;
use crate::dataset::Record;
use crate::identity::{Candidate, IdentityEngine, Verdict};
use crate::planner::{DateWindow, plan};

/// First retry waits this long; each further retry doubles it
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Counters describing what happened during a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Search result pages requested
    pub pages_requested: usize,

    /// Search result pages that failed to resolve
    pub pages_failed: usize,

    /// Topics whose every search page failed
    pub topics_failed: usize,

    /// Distinct links found across a topic's pages
    pub links_discovered: usize,

    /// Links skipped because the URL was already accepted this run
    pub links_already_seen: usize,

    /// Documents fetched and parsed
    pub documents_fetched: usize,

    /// Documents that could not be fetched or parsed
    pub documents_failed: usize,

    /// Documents whose body was too short to become a record
    pub too_short: usize,

    /// Documents rejected as duplicates
    pub duplicates: usize,

    /// Records accepted
    pub accepted: usize,
}

impl AddAssign for CrawlStats {
    fn add_assign(&mut self, other: Self) {
        self.pages_requested += other.pages_requested;
        self.pages_failed += other.pages_failed;
        self.topics_failed += other.topics_failed;
        self.links_discovered += other.links_discovered;
        self.links_already_seen += other.links_already_seen;
        self.documents_fetched += other.documents_fetched;
        self.documents_failed += other.documents_failed;
        self.too_short += other.too_short;
        self.duplicates += other.duplicates;
        self.accepted += other.accepted;
    }
}

/// Drives one topic from search pages to accepted records
///
/// Transport failures for a page or a document are logged and skipped; a
/// topic whose search pages all fail is skipped as a whole. Nothing here
/// aborts a run.
pub struct Orchestrator<'a, R, F> {
    resolver: &'a R,
    fetcher: &'a F,
    pacer: &'a Pacer,
    config: &'a CrawlerConfig,
}

impl<'a, R, F> Orchestrator<'a, R, F>
where
    R: LinkResolver,
    F: DocumentFetcher,
{
    pub fn new(resolver: &'a R, fetcher: &'a F, pacer: &'a Pacer, config: &'a CrawlerConfig) -> Self {
        Self {
            resolver,
            fetcher,
            pacer,
            config,
        }
    }

    /// Run one request behind the pacer, retrying transient failures
    ///
    /// Every attempt waits for its own permit, so retries never reach the
    /// source faster than the configured delay.
    async fn paced<T, Fut>(&self, target: &str, attempt: impl Fn() -> Fut) -> Result<T, CrawlError>
    where
        Fut: Future<Output = Result<T, CrawlError>>,
    {
        let mut retries = 0;
        loop {
            self.pacer.acquire().await;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < self.config.max_retries => {
                    let backoff = RETRY_BASE_DELAY.saturating_mul(1 << retries.min(6));
                    warn!("Retrying {} in {:?} after: {}", target, backoff, e);
                    tokio::time::sleep(backoff).await;
                    retries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Union of the links on every planned search page for `topic`
    ///
    /// Links keep the order in which they were first seen. A failed page
    /// contributes no links; the call only fails when every page failed.
    #[instrument(skip(self, window, stats))]
    pub async fn discover_links(
        &self,
        topic: &str,
        window: &DateWindow,
        stats: &mut CrawlStats,
    ) -> Result<Vec<String>, CrawlError> {
        let requests = plan(topic, window, self.config.pages_per_topic);
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut failed = 0;
        let mut last_error = None;

        for request in &requests {
            stats.pages_requested += 1;
            let target = format!("page {} of '{}'", request.page_index + 1, topic);

            match self.paced(&target, || self.resolver.resolve_links(request)).await {
                Ok(page_links) => {
                    for link in page_links {
                        if seen.insert(link.clone()) {
                            links.push(link);
                        }
                    }
                }
                Err(e) => {
                    warn!("Search page {} failed: {}", request.page_index + 1, e);
                    stats.pages_failed += 1;
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failed == requests.len() => Err(e),
            _ => Ok(links),
        }
    }

    /// Crawl one topic, appending accepted records to `records`
    #[instrument(skip(self, window, identity, records))]
    pub async fn crawl_topic(
        &self,
        topic: &str,
        window: &DateWindow,
        identity: &mut IdentityEngine,
        records: &mut Vec<Record>,
    ) -> CrawlStats {
        let mut stats = CrawlStats::default();

        let links = match self.discover_links(topic, window, &mut stats).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Skipping topic '{}', link resolution failed: {}", topic, e);
                stats.topics_failed += 1;
                return stats;
            }
        };
        stats.links_discovered = links.len();

        let pending: Vec<String> = links
            .into_iter()
            .filter(|url| {
                let seen = identity.is_seen(url);
                if seen {
                    debug!("Skipping already collected URL: {}", url);
                    stats.links_already_seen += 1;
                }
                !seen
            })
            .collect();
        info!("{} links to fetch for '{}'", pending.len(), topic);

        // `buffered` yields results in link order, so identity decisions do
        // not depend on which fetch finishes first.
        let mut fetches = pin!(
            stream::iter(pending)
                .map(|url| async move {
                    let result = self.paced(&url, || self.fetcher.fetch_document(&url)).await;
                    (url, result)
                })
                .buffered(self.config.fetch_concurrency.max(1))
        );

        while let Some((url, result)) = fetches.next().await {
            let document = match result {
                Ok(document) => document,
                Err(e) => {
                    warn!("Failed to scrape {}: {}", url, e);
                    stats.documents_failed += 1;
                    continue;
                }
            };
            stats.documents_fetched += 1;

            let Some(record) = to_record(document, self.config) else {
                debug!("Content too short: {}", url);
                stats.too_short += 1;
                continue;
            };

            let candidate = Candidate {
                url: &record.url,
                media_name: &record.media_name,
                title: &record.title,
                content: &record.content,
            };
            match identity.check(&candidate) {
                Verdict::Novel(fingerprint) => {
                    identity.commit(&record.url, fingerprint);
                    stats.accepted += 1;
                    records.push(record);
                }
                verdict => {
                    info!("Skipping duplicate: {} ({:?})", url, verdict);
                    stats.duplicates += 1;
                }
            }
        }

        info!(
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            failed = stats.documents_failed,
            "Finished topic '{}'",
            topic
        );
        stats
    }
}
