//! Content extraction functionality for the crawler module

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::crawler::error::CrawlError;
use crate::crawler::{CrawlerConfig, RawDocument};
use crate::dataset::{MAX_CELL_CHARS, Record, UNKNOWN_DATE};

/// URL fragments that mark search-engine chrome rather than articles
const EXCLUDED_LINK_PATTERNS: &[&str] = &["google.com", "/settings", "/policies"];

/// Publish-date sources, most reliable first
enum DateSource {
    Attr(&'static str, &'static str),
    Text(&'static str),
}

const DATE_SOURCES: &[DateSource] = &[
    DateSource::Attr(r#"meta[property="article:published_time"]"#, "content"),
    DateSource::Attr("time", "datetime"),
    DateSource::Text("time"),
    DateSource::Attr(r#"meta[name="date"]"#, "content"),
    DateSource::Text(r#"[class*="date"], [class*="time"], [class*="publish"]"#),
];

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Extract article links from a search result page
///
/// Every anchor is resolved against `page_url`; only absolute http(s) links
/// that do not point back at the search engine survive. Order of first
/// appearance is kept and duplicates are dropped.
pub fn extract_links(page_url: &Url, html: &str) -> Result<Vec<String>, CrawlError> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }

        let link = resolved.to_string();
        if EXCLUDED_LINK_PATTERNS.iter().any(|p| link.contains(p)) {
            continue;
        }
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    Ok(links)
}

/// Extract title, publish date and body text from an article page
///
/// # Arguments
///
/// * `url` - The URL the page was fetched from
/// * `html` - The HTML of the page
/// * `min_block_chars` - Paragraphs must be longer than this to count as body text
pub fn extract_document(
    url: &str,
    html: &str,
    min_block_chars: usize,
) -> Result<RawDocument, CrawlError> {
    let document = Html::parse_document(html);

    let heading = selector("h1")?;
    let page_title = selector("title")?;
    let title = document
        .select(&heading)
        .next()
        .map(element_text)
        .and_then(non_empty)
        .or_else(|| {
            let text = document.select(&page_title).map(element_text).collect::<String>();
            non_empty(text)
        });

    let mut published = None;
    for source in DATE_SOURCES {
        let candidate = match source {
            DateSource::Attr(css, attr) => document
                .select(&selector(css)?)
                .next()
                .and_then(|element| element.value().attr(attr))
                .map(|value| value.trim().to_string()),
            DateSource::Text(css) => document.select(&selector(css)?).next().map(element_text),
        };
        if let Some(value) = candidate.and_then(non_empty) {
            published = Some(value);
            break;
        }
    }

    let paragraph = selector("p")?;
    let body = document
        .select(&paragraph)
        .map(element_text)
        .filter(|text| text.chars().count() > min_block_chars)
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(RawDocument {
        url: url.to_string(),
        title,
        published,
        body,
    })
}

/// Normalize a publish date to `YYYY-MM-DD`
///
/// Only strict ISO-8601 forms are accepted; the calendar date is taken as
/// written, without converting between offsets. Anything else becomes
/// [`UNKNOWN_DATE`].
pub fn normalize_date(text: &str) -> String {
    let text = text.trim();

    let date = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            // `%#z` also takes `Z`, `+hh` and `+hhmm`
            ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%#z", "%Y-%m-%dT%H:%M%#z"]
                .iter()
                .find_map(|format| DateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok());

    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

/// Outlet name for a URL: its host without a leading `www.`
pub fn media_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

/// Turn an extracted document into a record
///
/// Returns `None` when the body is not longer than `min_content_chars`.
/// Missing titles become empty strings and unparseable dates become
/// [`UNKNOWN_DATE`]; neither blocks the record. Titles are cut to
/// [`MAX_CELL_CHARS`].
pub fn to_record(document: RawDocument, config: &CrawlerConfig) -> Option<Record> {
    if document.body.chars().count() <= config.min_content_chars {
        return None;
    }

    let content = document.body.chars().take(config.max_content_chars).collect();
    let date = document
        .published
        .as_deref()
        .map(normalize_date)
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    Some(Record {
        media_name: media_name(&document.url),
        date,
        title: document
            .title
            .map(|title| title.chars().take(MAX_CELL_CHARS).collect())
            .unwrap_or_default(),
        content,
        url: document.url,
    })
}
