//! Durable fingerprint set persisted as a JSON array of strings

use std::collections::HashSet;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use super::Fingerprint;
use crate::persist::write_atomic;

/// Error type for fingerprint store persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed fingerprint file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Set of fingerprints accumulated over every run
///
/// Loaded wholesale at the start of a run and overwritten wholesale at the
/// end. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
    fingerprints: HashSet<Fingerprint>,
}

impl FingerprintStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`, or start empty if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No fingerprint store at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let fingerprints: Vec<Fingerprint> =
            serde_json::from_str(&json).map_err(|source| StoreError::Json {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Loaded {} fingerprints from {}", fingerprints.len(), path.display());

        Ok(fingerprints.into_iter().collect())
    }

    /// Overwrite `path` with the full store
    ///
    /// Entries are written sorted so consecutive runs produce stable files.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let mut sorted: Vec<&Fingerprint> = self.fingerprints.iter().collect();
        sorted.sort();

        let json = serde_json::to_string_pretty(&sorted).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        write_atomic(path, json.as_bytes()).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        info!("Stored {} fingerprints in {}", self.len(), path.display());
        Ok(())
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    /// Add a fingerprint, returning `false` if it was already present
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.fingerprints.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl FromIterator<Fingerprint> for FingerprintStore {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            fingerprints: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fingerprint;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::load(dir.path().join("fingerprints.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");

        let mut store = FingerprintStore::new();
        assert!(store.insert(fingerprint("Crash", "Body one")));
        assert!(store.insert(fingerprint("Collision", "Body two")));
        assert!(!store.insert(fingerprint("crash", "body one")));
        store.save(&path).unwrap();

        let loaded = FingerprintStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&fingerprint("Crash", "Body one")));
        assert!(loaded.contains(&fingerprint("Collision", "Body two")));
    }

    #[test]
    fn test_saved_file_is_sorted_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");

        let store: FingerprintStore = ["b-two", "a-one"]
            .into_iter()
            .map(Fingerprint::from_raw)
            .collect();
        store.save(&path).unwrap();

        let raw: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["a-one".to_string(), "b-two".to_string()]);
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");
        std::fs::write(&path, "{ not an array").unwrap();

        match FingerprintStore::load(&path) {
            Err(StoreError::Json { path: p, .. }) => assert!(p.ends_with("fingerprints.json")),
            other => panic!("Expected Json error, got {:?}", other),
        }
    }
}
