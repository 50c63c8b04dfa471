//! Two-phase duplicate detection

use std::collections::HashSet;

use tracing::debug;

use super::{Fingerprint, FingerprintScope, FingerprintStore};

/// An article about to be accepted into the dataset
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub url: &'a str,
    pub media_name: &'a str,
    pub title: &'a str,
    pub content: &'a str,
}

/// Outcome of checking a candidate against everything seen so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not seen before. Pass the fingerprint to [`IdentityEngine::commit`].
    Novel(Fingerprint),

    /// The URL was already accepted earlier in this run
    SeenUrl,

    /// Another article with the same fingerprint exists, in this or a previous run
    SeenContent(Fingerprint),
}

impl Verdict {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Verdict::Novel(_))
    }
}

/// Run-scoped duplicate detector
///
/// Owns the URLs accepted during the current run and the cross-run
/// [`FingerprintStore`]. Both only ever grow.
#[derive(Debug, Default)]
pub struct IdentityEngine {
    seen_urls: HashSet<String>,
    store: FingerprintStore,
    scope: FingerprintScope,
}

impl IdentityEngine {
    /// Create an engine backed by a previously loaded store
    pub fn new(store: FingerprintStore, scope: FingerprintScope) -> Self {
        Self {
            seen_urls: HashSet::new(),
            store,
            scope,
        }
    }

    /// Whether the URL was already accepted in this run
    ///
    /// Cheap enough to call before fetching anything.
    pub fn is_seen(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Decide whether the candidate is novel without changing any state
    pub fn check(&self, candidate: &Candidate<'_>) -> Verdict {
        if self.is_seen(candidate.url) {
            return Verdict::SeenUrl;
        }

        let fingerprint =
            self.scope
                .fingerprint(candidate.media_name, candidate.title, candidate.content);
        if self.store.contains(&fingerprint) {
            debug!(url = candidate.url, "Fingerprint already stored");
            Verdict::SeenContent(fingerprint)
        } else {
            Verdict::Novel(fingerprint)
        }
    }

    /// Record an accepted article so later encounters are rejected
    pub fn commit(&mut self, url: &str, fingerprint: Fingerprint) {
        self.seen_urls.insert(url.to_string());
        self.store.insert(fingerprint);
    }

    /// Number of URLs accepted in this run
    pub fn seen_url_count(&self) -> usize {
        self.seen_urls.len()
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    /// Give up the run-scoped state and keep only the durable store
    pub fn into_store(self) -> FingerprintStore {
        self.store
    }
}
