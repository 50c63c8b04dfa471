//! # Query Planner
//!
//! Expands a topic and a rolling date window into the fixed sequence of
//! paginated news-search requests issued for that topic. Planning is pure;
//! rendering a request into a URL is the only place a search endpoint is
//! involved.

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use url::Url;

/// Results per search page; page offsets advance by this amount
pub const PAGE_SIZE: u32 = 10;

/// Format used for date bounds in search requests
const QUERY_DATE_FORMAT: &str = "%m/%d/%Y";

/// Inclusive calendar interval applied to every query in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Create a window, or `None` if `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The window from `years` years before `today` up to `today`
    ///
    /// February 29th clamps to February 28th in non-leap years.
    pub fn lookback_years(years: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// The lookback window ending on the local current date
    pub fn ending_today(years: u32) -> Self {
        Self::lookback_years(years, Local::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// One page of search results to request for a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text, exactly as it appears in the catalogue
    pub topic: String,

    /// Zero-based page index
    pub page_index: u32,

    /// Lower date bound, `MM/DD/YYYY`
    pub min_date: String,

    /// Upper date bound, `MM/DD/YYYY`
    pub max_date: String,

    /// Pagination offset, `page_index * PAGE_SIZE`
    pub offset: u32,
}

impl SearchRequest {
    /// Render the request against a news-search endpoint
    pub fn to_url(&self, base_url: &str) -> Result<Url, url::ParseError> {
        let date_range = format!("cdr:1,cd_min:{},cd_max:{}", self.min_date, self.max_date);
        let offset = self.offset.to_string();
        Url::parse_with_params(
            base_url,
            &[
                ("q", self.topic.as_str()),
                ("tbm", "nws"),
                ("tbs", date_range.as_str()),
                ("start", offset.as_str()),
            ],
        )
    }
}

/// Plan `page_count` search requests for `topic` within `window`
pub fn plan(topic: &str, window: &DateWindow, page_count: u32) -> Vec<SearchRequest> {
    let min_date = window.start.format(QUERY_DATE_FORMAT).to_string();
    let max_date = window.end.format(QUERY_DATE_FORMAT).to_string();

    (0..page_count)
        .map(|page_index| SearchRequest {
            topic: topic.to_string(),
            page_index,
            min_date: min_date.clone(),
            max_date: max_date.clone(),
            offset: page_index * PAGE_SIZE,
        })
        .collect()
}
