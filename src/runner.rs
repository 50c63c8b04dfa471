//! # Run Controller
//!
//! Sequences a complete harvest run:
//!
//! 1. Load the fingerprint store (empty if absent)
//! 2. Crawl every topic in catalogue order, accumulating accepted records
//! 3. Merge the accumulated records into the persisted dataset and rewrite it
//! 4. Rewrite the fingerprint store
//!
//! Per-page and per-document failures are absorbed by the crawler. Storage
//! failures abort the run, and nothing is written before step 3.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::crawler::{CrawlStats, CrawlerConfig, DocumentFetcher, LinkResolver, Orchestrator, Pacer};
use crate::dataset::{DatasetStore, Record, merge};
use crate::error::Result;
use crate::identity::{FingerprintScope, FingerprintStore, IdentityEngine};
use crate::planner::DateWindow;

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records accepted during this run
    pub new_records: usize,

    /// Rows in the dataset after the merge
    pub total_records: usize,

    /// Fingerprints in the store after the run
    pub total_fingerprints: usize,

    pub stats: CrawlStats,
}

/// Progress notification sent after each topic completes
#[derive(Debug, Clone)]
pub struct TopicProgress {
    pub topic: String,
    pub stats: CrawlStats,
}

/// Mutable state owned by a single run
///
/// Created when the run starts and consumed when it is persisted.
#[derive(Debug, Default)]
pub struct RunState {
    identity: IdentityEngine,
    records: Vec<Record>,
    stats: CrawlStats,
}

impl RunState {
    pub fn new(store: FingerprintStore, scope: FingerprintScope) -> Self {
        Self {
            identity: IdentityEngine::new(store, scope),
            records: Vec::new(),
            stats: CrawlStats::default(),
        }
    }
}

/// Runs the full pipeline against a set of collaborators
pub struct RunController<'a, R, F, D> {
    config: &'a CrawlerConfig,
    resolver: &'a R,
    fetcher: &'a F,
    dataset: &'a D,
    progress: Option<mpsc::Sender<TopicProgress>>,
}

impl<'a, R, F, D> RunController<'a, R, F, D>
where
    R: LinkResolver,
    F: DocumentFetcher,
    D: DatasetStore,
{
    pub fn new(config: &'a CrawlerConfig, resolver: &'a R, fetcher: &'a F, dataset: &'a D) -> Self {
        Self {
            config,
            resolver,
            fetcher,
            dataset,
            progress: None,
        }
    }

    /// Report each finished topic on `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<TopicProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Crawl every topic within `window`, then persist the results
    #[instrument(skip_all, fields(topics = self.config.topics.len()))]
    pub async fn run(&self, window: DateWindow) -> Result<RunSummary> {
        self.config.validate()?;

        let store = FingerprintStore::load(&self.config.fingerprints_path)?;
        info!(
            "Starting run over {} topics from {} to {} with {} known fingerprints",
            self.config.topics.len(),
            window.start(),
            window.end(),
            store.len()
        );

        let mut state = RunState::new(store, self.config.fingerprint_scope);
        let pacer = Pacer::new(self.config.delay());
        let orchestrator = Orchestrator::new(self.resolver, self.fetcher, &pacer, self.config);

        for topic in &self.config.topics {
            info!("Searching topic '{}'", topic);
            let stats = orchestrator
                .crawl_topic(topic, &window, &mut state.identity, &mut state.records)
                .await;
            state.stats += stats;

            if let Some(progress) = &self.progress {
                // A dropped receiver only means nobody is watching.
                let _ = progress
                    .send(TopicProgress {
                        topic: topic.clone(),
                        stats,
                    })
                    .await;
            }
        }

        self.persist(state)
    }

    /// Merge the run's records into the dataset and save both stores
    fn persist(&self, state: RunState) -> Result<RunSummary> {
        let RunState {
            identity,
            records,
            stats,
        } = state;
        let new_records = records.len();

        let existing = self.dataset.load()?;
        let merged = merge(existing, records);
        self.dataset.save(&merged)?;

        let store = identity.into_store();
        store.save(&self.config.fingerprints_path)?;

        let summary = RunSummary {
            new_records,
            total_records: merged.len(),
            total_fingerprints: store.len(),
            stats,
        };
        info!(
            new_records = summary.new_records,
            total_records = summary.total_records,
            total_fingerprints = summary.total_fingerprints,
            "Run complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fakes::{BODY, FakeFetcher, FakeResolver, window};
    use crate::dataset::{DatasetError, XlsxStore};
    use crate::error::Error;
    use crate::identity::fingerprint;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    /// Dataset kept in memory; optionally refuses to save
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Record>>,
        fail_save: bool,
    }

    impl DatasetStore for MemoryStore {
        fn load(&self) -> std::result::Result<Vec<Record>, DatasetError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        fn save(&self, records: &[Record]) -> std::result::Result<(), DatasetError> {
            if self.fail_save {
                return Err(DatasetError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            *self.rows.lock().unwrap() = records.to_vec();
            Ok(())
        }
    }

    fn config(dir: &Path) -> CrawlerConfig {
        CrawlerConfig::builder()
            .topics(["scooter fatality", "scooter collision"])
            .pages_per_topic(2)
            .delay_ms(0)
            .output_path(dir.join("news.xlsx"))
            .fingerprints_path(dir.join("fingerprints.json"))
            .build()
    }

    fn resolver() -> FakeResolver {
        FakeResolver::default()
            .page("scooter fatality", 0, &["https://news.example/a", "https://news.example/b"])
            .page("scooter fatality", 1, &["https://news.example/a"])
            .page("scooter collision", 0, &["https://news.example/b", "https://mirror.example/a"])
            .page("scooter collision", 1, &["https://news.example/c"])
    }

    fn fetcher() -> FakeFetcher {
        FakeFetcher::default()
            .article("https://news.example/a", "Rider killed", BODY)
            .article("https://news.example/b", "Scooter hits bus", &format!("{} Bus.", BODY))
            .article("https://mirror.example/a", "Rider Killed!", BODY)
            .timeout("https://news.example/c")
    }

    #[tokio::test]
    async fn test_run_persists_dataset_and_fingerprints() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let resolver = resolver();
        let fetcher = fetcher();
        let dataset = XlsxStore::new(&config.output_path);

        let summary = RunController::new(&config, &resolver, &fetcher, &dataset)
            .run(window())
            .await
            .unwrap();

        assert_eq!(summary.new_records, 2);
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.total_fingerprints, 2);
        assert_eq!(summary.stats.duplicates, 1);
        assert_eq!(summary.stats.documents_failed, 1);
        assert_eq!(summary.stats.links_already_seen, 1);
        assert_eq!(fetcher.fetch_count("https://news.example/b"), 1);

        let rows = dataset.load().unwrap();
        let urls: Vec<&str> = rows.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://news.example/a", "https://news.example/b"]);

        let store = FingerprintStore::load(&config.fingerprints_path).unwrap();
        assert!(store.contains(&fingerprint("Rider killed", BODY)));
    }

    #[tokio::test]
    async fn test_rerun_adds_no_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let dataset = MemoryStore::default();

        let first = RunController::new(&config, &resolver(), &fetcher(), &dataset)
            .run(window())
            .await
            .unwrap();
        let second = RunController::new(&config, &resolver(), &fetcher(), &dataset)
            .run(window())
            .await
            .unwrap();

        assert_eq!(second.new_records, 0);
        assert_eq!(second.total_records, first.total_records);
        assert_eq!(second.total_fingerprints, first.total_fingerprints);

        let rows = dataset.load().unwrap();
        let fingerprints: HashSet<_> = rows
            .iter()
            .map(|r| fingerprint(&r.title, &r.content))
            .collect();
        assert_eq!(fingerprints.len(), rows.len());
    }

    #[tokio::test]
    async fn test_run_refreshes_existing_rows_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let dataset = MemoryStore::default();
        dataset.save(&[
            Record {
                media_name: "old.example".to_string(),
                date: "2020-01-01".to_string(),
                title: "Old".to_string(),
                content: "Previously collected".to_string(),
                url: "https://old.example/x".to_string(),
            },
            Record {
                media_name: "news.example".to_string(),
                date: "Unknown".to_string(),
                title: "Stale title".to_string(),
                content: "Stale content".to_string(),
                url: "https://news.example/a".to_string(),
            },
        ])
        .unwrap();

        let summary = RunController::new(&config, &resolver(), &fetcher(), &dataset)
            .run(window())
            .await
            .unwrap();

        assert_eq!(summary.total_records, 3);
        let rows = dataset.load().unwrap();
        assert_eq!(rows[0].url, "https://old.example/x");
        assert_eq!(rows[1].url, "https://news.example/a");
        assert_eq!(rows[1].title, "Rider killed");
        assert_eq!(rows[1].date, "2024-04-01");
        assert_eq!(rows[2].url, "https://news.example/b");
    }

    #[tokio::test]
    async fn test_dataset_failure_aborts_before_fingerprints_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let dataset = MemoryStore {
            fail_save: true,
            ..Default::default()
        };

        let result = RunController::new(&config, &resolver(), &fetcher(), &dataset)
            .run(window())
            .await;

        assert!(matches!(result, Err(Error::Dataset(_))));
        assert!(!config.fingerprints_path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_fingerprint_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        std::fs::write(&config.fingerprints_path, "not json").unwrap();
        let resolver = resolver();
        let dataset = MemoryStore::default();

        let result = RunController::new(&config, &resolver, &fetcher(), &dataset)
            .run(window())
            .await;

        assert!(matches!(result, Err(Error::FingerprintStore(_))));
        assert!(resolver.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_crawling() {
        let dir = tempfile::tempdir().unwrap();
        let config = CrawlerConfig::builder()
            .topics(Vec::<String>::new())
            .fingerprints_path(dir.path().join("fingerprints.json"))
            .build();
        let resolver = resolver();
        let dataset = MemoryStore::default();

        let result = RunController::new(&config, &resolver, &fetcher(), &dataset)
            .run(window())
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert!(resolver.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_topic() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let dataset = MemoryStore::default();
        let (sender, mut receiver) = mpsc::channel(8);

        RunController::new(&config, &resolver(), &fetcher(), &dataset)
            .with_progress(sender)
            .run(window())
            .await
            .unwrap();

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.topic, "scooter fatality");
        assert_eq!(first.stats.accepted, 2);
        assert_eq!(second.topic, "scooter collision");
        assert_eq!(second.stats.accepted, 0);
        assert!(receiver.recv().await.is_none());
    }
}
