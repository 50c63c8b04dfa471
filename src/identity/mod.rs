//! # Article Identity Module
//!
//! This module decides whether a candidate article is new or a duplicate of
//! something already collected, either earlier in the current run or in any
//! previous run.
//!
//! ## Key Components
//!
//! - `Fingerprint`: A lossy digest of an article's normalized title and content prefix
//! - `FingerprintScope`: Which fields feed the fingerprint
//! - `IdentityEngine`: Two-phase duplicate detection (`check`, then `commit`)
//! - `FingerprintStore`: The durable set of fingerprints persisted between runs
//!
//! ## Normalization
//!
//! Both title and content are lowercased and stripped of every character that
//! is not an ASCII word character (`[A-Za-z0-9_]`) or whitespace. The content
//! is then cut to its first [`CONTENT_PREFIX_CHARS`] characters and trimmed.
//! Two articles sharing a title and an opening paragraph therefore collide
//! even when their bodies diverge later on.

mod engine;
mod store;

pub use engine::{Candidate, IdentityEngine, Verdict};
pub use store::{FingerprintStore, StoreError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of normalized content characters that feed a fingerprint
pub const CONTENT_PREFIX_CHARS: usize = 150;

/// Normalized identity of an article, independent of its URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed fingerprint string, e.g. one read from disk
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fingerprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields that contribute to an article's fingerprint
///
/// `TitleAndContent` treats identical wire-service copy published by
/// different outlets as one article. `SourceTitleAndContent` keeps them apart
/// by prefixing the outlet name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintScope {
    #[default]
    TitleAndContent,
    SourceTitleAndContent,
}

impl FingerprintScope {
    /// Compute the fingerprint of an article under this scope
    pub fn fingerprint(&self, media_name: &str, title: &str, content: &str) -> Fingerprint {
        let base = fingerprint(title, content);
        match self {
            Self::TitleAndContent => base,
            Self::SourceTitleAndContent => {
                Fingerprint(format!("{}|{}", media_name.trim().to_lowercase(), base.0))
            }
        }
    }
}

/// Compute the fingerprint of an article from its title and content
///
/// Pure and deterministic; case and punctuation never affect the result.
pub fn fingerprint(title: &str, content: &str) -> Fingerprint {
    let title = simplify(title);
    let content: String = simplify(content)
        .chars()
        .take(CONTENT_PREFIX_CHARS)
        .collect();

    Fingerprint(format!("{}-{}", title.trim(), content.trim()))
}

fn simplify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}
