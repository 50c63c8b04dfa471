//! # Dataset Module
//!
//! The persisted collection of article records, keyed by URL. Every run reads
//! the whole dataset, merges the newly collected records into it and writes
//! the result back in full.
//!
//! ## Key Components
//!
//! - `Record`: One article row
//! - `merge`: Last-write-wins reconciliation by URL
//! - `DatasetStore`: Whole-dataset read/write capability
//! - `XlsxStore`: Spreadsheet-backed store

mod xlsx;

pub use xlsx::{SheetLayout, XlsxStore};

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date value used when a publish date cannot be parsed
pub const UNKNOWN_DATE: &str = "Unknown";

/// Longest text a spreadsheet cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Column headers of the persisted dataset, in order
pub const COLUMNS: [&str; 5] = [
    "News Media Name",
    "Date",
    "Title of the News",
    "Descriptive Text",
    "URL",
];

/// One collected article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Outlet name, derived from the URL host
    pub media_name: String,

    /// Publish date as `YYYY-MM-DD`, or [`UNKNOWN_DATE`]
    pub date: String,

    pub title: String,

    /// Body text, truncated
    pub content: String,

    /// Merge key
    pub url: String,
}

impl Record {
    /// Cells in [`COLUMNS`] order
    pub fn cells(&self) -> [&str; 5] {
        [
            self.media_name.as_str(),
            self.date.as_str(),
            self.title.as_str(),
            self.content.as_str(),
            self.url.as_str(),
        ]
    }
}

/// `text` cut to at most [`MAX_CELL_CHARS`] characters
pub(crate) fn clamp_cell(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Error type for dataset persistence
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Spreadsheet read error: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook {0} has no worksheet")]
    MissingSheet(String),

    #[error("Missing column {0:?} in header row")]
    MissingColumn(&'static str),
}

/// Read/write access to the whole persisted dataset
pub trait DatasetStore {
    /// Read every record, or nothing if the dataset does not exist yet
    fn load(&self) -> Result<Vec<Record>, DatasetError>;

    /// Replace the persisted dataset with `records`
    fn save(&self, records: &[Record]) -> Result<(), DatasetError>;
}

/// Reconcile an existing dataset with newly collected records
///
/// Records are keyed by URL. A URL present in both keeps its original
/// position but takes the new record's fields; URLs only in `new_records`
/// are appended in order. The output never contains two records with the
/// same URL.
pub fn merge(existing: Vec<Record>, new_records: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(existing.len() + new_records.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in existing.into_iter().chain(new_records) {
        match positions.get(&record.url) {
            Some(&index) => merged[index] = record,
            None => {
                positions.insert(record.url.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(url: &str, title: &str) -> Record {
        Record {
            media_name: "news.example".to_string(),
            date: "2024-05-01".to_string(),
            title: title.to_string(),
            content: "content".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_merge_new_record_wins() {
        let existing = vec![record("https://a", "old a"), record("https://b", "old b")];
        let new_records = vec![record("https://b", "new b"), record("https://c", "new c")];

        let merged = merge(existing, new_records);

        let titles: Vec<&str> = merged.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["old a", "new b", "new c"]);
    }

    #[test]
    fn test_merge_has_unique_urls() {
        let existing = vec![
            record("https://a", "a1"),
            record("https://a", "a2"),
            record("https://b", "b1"),
        ];
        let new_records = vec![
            record("https://b", "b2"),
            record("https://c", "c1"),
            record("https://c", "c2"),
        ];

        let merged = merge(existing, new_records);
        let urls: HashSet<&str> = merged.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls.len(), merged.len());
        assert_eq!(merged.len(), 3);

        let by_url = |url: &str| merged.iter().find(|r| r.url == url).unwrap().title.clone();
        assert_eq!(by_url("https://a"), "a2");
        assert_eq!(by_url("https://b"), "b2");
        assert_eq!(by_url("https://c"), "c2");
    }

    #[test]
    fn test_merge_with_empty_sides() {
        assert!(merge(Vec::new(), Vec::new()).is_empty());
        assert_eq!(merge(vec![record("https://a", "a")], Vec::new()).len(), 1);
        assert_eq!(merge(Vec::new(), vec![record("https://a", "a")]).len(), 1);
    }

    #[test]
    fn test_clamp_cell() {
        assert_eq!(clamp_cell("short"), "short");

        let exact = "a".repeat(MAX_CELL_CHARS);
        assert_eq!(clamp_cell(&exact), exact);

        let multibyte = "ü".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(clamp_cell(&multibyte).chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_record_cells_follow_column_order() {
        let r = record("https://a", "Title");
        assert_eq!(
            r.cells(),
            ["news.example", "2024-05-01", "Title", "content", "https://a"]
        );
    }
}
