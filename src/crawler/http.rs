//! HTTP implementation of the crawler collaborators
//!
//! A single `reqwest` client serves both the search result pages and the
//! article pages, with the configured user agent and per-request timeout.

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::crawler::content_extraction::{extract_document, extract_links};
use crate::crawler::error::CrawlError;
use crate::crawler::source::{DocumentFetcher, LinkResolver};
use crate::crawler::{CrawlerConfig, RawDocument};
use crate::planner::SearchRequest;

/// Fetches search pages and articles over HTTP
///
/// Each call makes exactly one request. Pacing and retries belong to the
/// caller, so every attempt passes through the same rate limit.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    search_base_url: String,
    min_block_chars: usize,
}

impl HttpFetcher {
    /// Create a fetcher from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            search_base_url: config.search_base_url.clone(),
            min_block_chars: config.min_block_chars,
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_html(&self, url: &str) -> Result<String, CrawlError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, err: reqwest::Error) -> CrawlError {
    if err.is_timeout() {
        CrawlError::Timeout(url.to_string())
    } else {
        CrawlError::Http(err)
    }
}

impl LinkResolver for HttpFetcher {
    #[instrument(skip(self, request), fields(topic = %request.topic, page = request.page_index))]
    async fn resolve_links(&self, request: &SearchRequest) -> Result<Vec<String>, CrawlError> {
        let url = request.to_url(&self.search_base_url)?;
        info!("Page {}: {}", request.page_index + 1, url);

        let html = self.get_html(url.as_str()).await?;
        let links = extract_links(&url, &html)?;
        debug!("Found {} links", links.len());
        Ok(links)
    }
}

impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch_document(&self, url: &str) -> Result<RawDocument, CrawlError> {
        info!("Scraping: {}", url);
        let html = self.get_html(url).await?;
        extract_document(url, &html, self.min_block_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{DateWindow, plan};
    use chrono::NaiveDate;
    use mockito::{Matcher, Server};

    fn fetcher_for(server: &Server) -> HttpFetcher {
        let config = CrawlerConfig::builder()
            .search_base_url(format!("{}/search", server.url()))
            .user_agent("newsharvest-test")
            .build();
        HttpFetcher::new(&config).unwrap()
    }

    fn first_request(topic: &str) -> SearchRequest {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap();
        plan(topic, &window, 1).remove(0)
    }

    #[tokio::test]
    async fn test_resolve_links() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "scooter fatality".into()),
                Matcher::UrlEncoded("tbm".into(), "nws".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
            ]))
            .match_header("user-agent", "newsharvest-test")
            .with_status(200)
            .with_body(
                r#"<html><body>
                <a href="https://news.example/a">A</a>
                <a href="https://www.google.com/preferences">Prefs</a>
                <a href="https://news.example/b">B</a>
                </body></html>"#,
            )
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server);
        let links = fetcher
            .resolve_links(&first_request("scooter fatality"))
            .await
            .unwrap();

        assert_eq!(
            links,
            vec![
                "https://news.example/a".to_string(),
                "https://news.example/b".to_string()
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let mut server = Server::new_async().await;
        let paragraph = "The rider suffered a head injury after the scooter struck a curb on Main Street.";
        let mock = server
            .mock("GET", "/story")
            .with_status(200)
            .with_body(format!(
                r#"<html><head><meta property="article:published_time" content="2024-06-01T08:00:00Z"></head>
                <body><h1>Rider injured</h1><p>{}</p></body></html>"#,
                paragraph
            ))
            .create_async()
            .await;

        let fetcher = fetcher_for(&server);
        let url = format!("{}/story", server.url());
        let document = fetcher.fetch_document(&url).await.unwrap();

        assert_eq!(document.url, url);
        assert_eq!(document.title.as_deref(), Some("Rider injured"));
        assert_eq!(document.published.as_deref(), Some("2024-06-01T08:00:00Z"));
        assert_eq!(document.body, paragraph);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server);
        let result = fetcher
            .fetch_document(&format!("{}/missing", server.url()))
            .await;

        assert!(matches!(result, Err(CrawlError::Status { status: 404, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetcher_makes_a_single_attempt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher_for(&server);
        let result = fetcher
            .fetch_document(&format!("{}/flaky", server.url()))
            .await;

        assert!(matches!(&result, Err(e) if e.is_transient()));
        mock.assert_async().await;
    }
}
