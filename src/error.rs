//! Error taxonomy for the prospect pipeline.
//!
//! Every fallible subsystem gets its own small enum with a `Display` impl and
//! an empty `impl Error for X {}` rather than a derive-macro error type.
//! Stage-level failures never surface as these errors crossing
//! the DAG boundary — they're caught and turned into default outputs (see
//! [`crate::stage::agent`]) — these types exist so the boundary itself has
//! something typed to match on.

use std::error::Error;
use std::fmt;

/// Failures from an [`LlmClient`](crate::llm::client::LlmClient) call, before
/// the [`LlmGateway`](crate::llm::gateway::LlmGateway) retry policy kicks in.
#[derive(Debug, Clone)]
pub enum LlmError {
    /// The provider refused to generate (safety block). Never retried.
    Blocked(String),
    /// Provider-defined rate-limit signal.
    RateLimited,
    /// Network/transport failure (timeout, connection reset, 5xx, etc.).
    Transport(String),
    /// The provider returned a response the gateway couldn't make sense of.
    InvalidResponse(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Blocked(msg) => write!(f, "content blocked: {}", msg),
            LlmError::RateLimited => write!(f, "rate limited"),
            LlmError::Transport(msg) => write!(f, "transport error: {}", msg),
            LlmError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// JSON salvage failed after stripping fenced code blocks and hunting for
/// leading/trailing prose.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// First ~200 characters of the raw response, for the caller's
    /// `error_message`.
    pub raw_head: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse JSON from response: {}", self.raw_head)
    }
}

impl Error for ParseError {}

/// Failures from the external web-search collaborator.
#[derive(Debug, Clone)]
pub enum SearchError {
    /// The search backend is unreachable or returned an error.
    Unavailable(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Unavailable(msg) => write!(f, "search unavailable: {}", msg),
        }
    }
}

impl Error for SearchError {}

/// Failures from the HTTP scrape collaborator.
#[derive(Debug, Clone)]
pub enum ScrapeError {
    /// The fetch exceeded its deadline.
    Timeout,
    /// The server responded with a non-2xx status.
    Http(u16),
    /// The body could not be interpreted as text/HTML.
    Format(String),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::Timeout => write!(f, "scrape timed out"),
            ScrapeError::Http(status) => write!(f, "scrape failed with HTTP {}", status),
            ScrapeError::Format(msg) => write!(f, "scrape returned unusable content: {}", msg),
        }
    }
}

impl Error for ScrapeError {}

/// Failures bubbling up from the RAG store's downstream collaborators.
#[derive(Debug, Clone)]
pub enum RagError {
    /// No embedding provider was configured or it failed; the store degrades
    /// to keyword overlap instead of raising.
    EmbeddingUnavailable(String),
    /// The vector index backing a job could not be reached.
    IndexUnavailable(String),
}

impl fmt::Display for RagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RagError::EmbeddingUnavailable(msg) => write!(f, "embedding unavailable: {}", msg),
            RagError::IndexUnavailable(msg) => write!(f, "vector index unavailable: {}", msg),
        }
    }
}

impl Error for RagError {}

/// Failures from the persistence collaborator.
#[derive(Debug, Clone)]
pub enum PersistenceError {
    /// No blob under the requested key.
    NotFound,
    /// The underlying store raised during put/get.
    Io(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::NotFound => write!(f, "no value for key"),
            PersistenceError::Io(msg) => write!(f, "persistence I/O error: {}", msg),
        }
    }
}

impl Error for PersistenceError {}

/// Orchestrator-level errors.
#[derive(Debug, Clone)]
pub enum OrchestratorError {
    /// Search failed and no fallback lead could be synthesized.
    SearchUnavailable(String),
    /// The persistence sidecar could not store the enriched context.
    PersistenceUnavailable(String),
    /// The RAG store raised an unhandled error during startup build.
    RagBuildFailed(String),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::SearchUnavailable(msg) => {
                write!(f, "search unavailable and fallback disabled: {}", msg)
            }
            OrchestratorError::PersistenceUnavailable(msg) => {
                write!(f, "persistence unavailable: {}", msg)
            }
            OrchestratorError::RagBuildFailed(msg) => write!(f, "RAG build failed: {}", msg),
        }
    }
}

impl Error for OrchestratorError {}
