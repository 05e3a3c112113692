//! Search and scrape traits.

use async_trait::async_trait;

use crate::error::{ScrapeError, SearchError};

/// One organic search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Outcome of fetching and cleaning one page.
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub title: String,
    pub text_content: String,
    /// Human-readable note on the fetch outcome — set even on success (e.g.
    /// `"ok"`) so callers can log it uniformly.
    pub status_message: String,
}

/// Web search collaborator. Failure propagates to the orchestrator, which
/// falls back to a synthesized lead.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Page-fetch collaborator. Failure is caught by the calling stage, which
/// decides whether to proceed with reduced information.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, ScrapeError>;
}
