//! Spreadsheet-backed dataset store

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{Datelike, Timelike, Utc};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use tracing::{debug, info};

use super::{COLUMNS, DatasetError, DatasetStore, Record, clamp_cell};
use crate::persist::write_atomic;

/// Presentation of the dataset sheet
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub sheet_name: String,

    /// Display width of each column, in [`COLUMNS`] order
    pub column_widths: [f64; 5],

    /// Document title property
    pub title: String,

    /// Document author property
    pub author: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Crash News".to_string(),
            column_widths: [25.0, 12.0, 60.0, 100.0, 50.0],
            title: "E-Scooter Crash News Dataset".to_string(),
            author: "E-Scooter News Bot".to_string(),
        }
    }
}

/// Dataset persisted as a single-sheet XLSX workbook
///
/// The first row holds the [`COLUMNS`] headers. Reading maps columns by
/// header name, so files whose columns were reordered by hand still load.
#[derive(Debug, Clone)]
pub struct XlsxStore {
    path: PathBuf,
    layout: SheetLayout,
}

impl XlsxStore {
    /// Create a store at `path` with the default sheet layout
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_layout(path, SheetLayout::default())
    }

    /// Create a store at `path` with a custom sheet layout
    pub fn with_layout(path: impl Into<PathBuf>, layout: SheetLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build_workbook(&self, records: &[Record]) -> Result<Workbook, DatasetError> {
        let mut workbook = Workbook::new();

        let now = Utc::now();
        let created = ExcelDateTime::from_ymd(now.year() as u16, now.month() as u8, now.day() as u8)?
            .and_hms(now.hour() as u16, now.minute() as u8, now.second())?;
        let properties = DocProperties::new()
            .set_title(self.layout.title.as_str())
            .set_author(self.layout.author.as_str())
            .set_creation_datetime(&created);
        workbook.set_properties(&properties);

        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.layout.sheet_name.as_str())?;

        for (col, width) in self.layout.column_widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
        for (col, header) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, value) in record.cells().iter().enumerate() {
                worksheet.write_string(row, col as u16, clamp_cell(value))?;
            }
        }

        Ok(workbook)
    }
}

impl DatasetStore for XlsxStore {
    fn load(&self) -> Result<Vec<Record>, DatasetError> {
        if !self.path.exists() {
            info!("No dataset at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let mut workbook: Xlsx<_> = open_workbook(&self.path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DatasetError::MissingSheet(self.path.display().to_string()))??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };

        let column = |name: &'static str| {
            header
                .iter()
                .position(|cell| cell.to_string().trim() == name)
                .ok_or(DatasetError::MissingColumn(name))
        };
        let [media, date, title, content, url] = [
            column(COLUMNS[0])?,
            column(COLUMNS[1])?,
            column(COLUMNS[2])?,
            column(COLUMNS[3])?,
            column(COLUMNS[4])?,
        ];

        let cell = |row: &[Data], index: usize| {
            row.get(index).map(|c| c.to_string()).unwrap_or_default()
        };

        let mut records = Vec::new();
        for row in rows {
            let row_url = cell(row, url);
            if row_url.trim().is_empty() {
                continue;
            }
            records.push(Record {
                media_name: cell(row, media),
                date: cell(row, date),
                title: cell(row, title),
                content: cell(row, content),
                url: row_url,
            });
        }

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn save(&self, records: &[Record]) -> Result<(), DatasetError> {
        let mut workbook = self.build_workbook(records)?;
        let buffer = workbook.save_to_buffer()?;
        write_atomic(&self.path, &buffer)?;

        info!("Saved {} total articles to {}", records.len(), self.path.display());
        Ok(())
    }
}
