//! Default HTTP-backed [`SearchClient`]/[`ScrapeClient`] implementations.
//!
//! [`TavilySearchClient`] speaks to the Tavily search API, used for both lead
//! harvesting and the `tavily_enrichment` stage's external-intelligence
//! lookups. [`HttpScrapeClient`] is a plain `GET` + cleanup pass, pooling
//! connections through one shared [`reqwest::Client`].

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::Deserialize;

use super::cleanup::clean_scraped_text;
use super::client::{ScrapeClient, ScrapeResult, SearchClient, SearchResult};
use crate::error::{ScrapeError, SearchError};

lazy_static! {
    /// Shared HTTP client with persistent connection pooling, reused by both
    /// collaborators below so lead workers calling concurrently don't each
    /// pay TLS/DNS setup cost per call.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build shared HTTP client");
}

/// Borrow the lazily initialized shared [`reqwest::Client`].
pub fn shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

#[derive(Debug, Deserialize)]
struct TavilyResponseItem {
    url: String,
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResponseItem>,
}

/// Search collaborator backed by the Tavily search API.
pub struct TavilySearchClient {
    api_key: String,
    endpoint: String,
}

impl TavilySearchClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: "https://api.tavily.com/search".to_string(),
        }
    }

    /// Override the endpoint, primarily for pointing tests at a local stub.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchClient for TavilySearchClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let response = shared_http_client()
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await
            .map_err(|e| SearchError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Unavailable(format!(
                "search API returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Unavailable(format!("malformed search response: {}", e)))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|item| SearchResult {
                url: item.url,
                title: item.title,
                snippet: item.content,
            })
            .collect())
    }
}

/// Scrape collaborator: plain `GET` over the shared client, then run the
/// cleanup pipeline.
pub struct HttpScrapeClient {
    max_characters: usize,
}

impl HttpScrapeClient {
    pub fn new(max_characters: usize) -> Self {
        Self { max_characters }
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let response = shared_http_client().get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout
            } else {
                ScrapeError::Format(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::Format(e.to_string()))?;

        let title = extract_title(&body).unwrap_or_else(|| url.to_string());
        let text_content = clean_scraped_text(&body, self.max_characters);

        Ok(ScrapeResult {
            title,
            text_content,
            status_message: "ok".to_string(),
        })
    }
}

fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_lowercase();
    let start = lower.find("<title>")? + "<title>".len();
    let end = lower[start..].find("</title>")? + start;
    Some(html[start..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_case_insensitively() {
        let html = "<HTML><Head><TITLE> Acme Corp </TITLE></Head></HTML>";
        assert_eq!(extract_title(html).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn missing_title_returns_none() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
    }
}
