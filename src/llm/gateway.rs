//! Retry, token-accounting, and JSON-salvage policy wrapped around an
//! [`LlmClient`].
//!
//! The client makes one call; the gateway decides whether and how to call it
//! again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{LlmError, ParseError};
use crate::llm::client::{LlmClient, TokenUsage};

/// One successful, already JSON-salvaged generation.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub attempts: u32,
}

/// Atomically-updated counters a gateway accumulates across every call it
/// serves, regardless of which lead worker is calling.
#[derive(Debug, Default)]
pub struct GatewayUsageStats {
    total_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_input_tokens: AtomicU64,
    total_output_tokens: AtomicU64,
}

impl GatewayUsageStats {
    pub fn snapshot(&self) -> (u64, u64, u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.total_input_tokens.load(Ordering::Relaxed),
            self.total_output_tokens.load(Ordering::Relaxed),
        )
    }
}

/// Wraps one [`LlmClient`] with the retry/backoff/JSON-salvage policy
/// shared by every stage agent.
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    max_retries: u32,
    retry_delay: Duration,
    stats: GatewayUsageStats,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, max_retries: u32, retry_delay_seconds: u64) -> Self {
        Self {
            client,
            max_retries: max_retries.max(1),
            retry_delay: Duration::from_secs(retry_delay_seconds),
            stats: GatewayUsageStats::default(),
        }
    }

    pub fn stats(&self) -> &GatewayUsageStats {
        &self.stats
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Run the retry loop for one prompt.
    pub async fn generate(&self, prompt: &str) -> Result<GatewayResponse, LlmError> {
        self.stats.total_requests.fetch_add(1, Ordering::Relaxed);
        let mut last_err = LlmError::InvalidResponse("no attempts made".to_string());

        for attempt in 0..self.max_retries {
            match self.client.complete(prompt).await {
                Ok(completion) => {
                    self.stats
                        .total_input_tokens
                        .fetch_add(completion.usage.input_tokens as u64, Ordering::Relaxed);
                    self.stats
                        .total_output_tokens
                        .fetch_add(completion.usage.output_tokens as u64, Ordering::Relaxed);
                    return Ok(GatewayResponse {
                        content: completion.content,
                        usage: completion.usage,
                        attempts: attempt + 1,
                    });
                }
                Err(LlmError::Blocked(msg)) => {
                    self.stats.failed_requests.fetch_add(1, Ordering::Relaxed);
                    return Err(LlmError::Blocked(msg));
                }
                Err(LlmError::RateLimited) => {
                    last_err = LlmError::RateLimited;
                    if attempt + 1 < self.max_retries {
                        let wait = self.retry_delay * (attempt + 2);
                        tokio::time::sleep(wait).await;
                    }
                }
                Err(other) => {
                    last_err = other;
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        self.stats.failed_requests.fetch_add(1, Ordering::Relaxed);
        Err(last_err)
    }

    /// Generate, then salvage JSON from the response. Never guesses values: parse failure is surfaced as
    /// [`ParseError`] carrying the raw text, not a best-effort partial value.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<(T, TokenUsage), LlmGatewayJsonError> {
        let response = self
            .generate(prompt)
            .await
            .map_err(LlmGatewayJsonError::Llm)?;
        let value = salvage_json::<T>(&response.content).map_err(LlmGatewayJsonError::Parse)?;
        Ok((value, response.usage))
    }
}

#[derive(Debug, Clone)]
pub enum LlmGatewayJsonError {
    Llm(LlmError),
    Parse(ParseError),
}

impl std::fmt::Display for LlmGatewayJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmGatewayJsonError::Llm(e) => write!(f, "{}", e),
            LlmGatewayJsonError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LlmGatewayJsonError {}

/// Strip an outermost fenced code block (` ```json ` or plain ` ``` `) if
/// present, then parse. Accepts raw JSON and JSON with leading/trailing
/// prose around a `{...}`/`[...]` span.
fn salvage_json<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let candidate = strip_fence(raw.trim());
    if let Ok(value) = serde_json::from_str::<T>(candidate) {
        return Ok(value);
    }
    if let Some(span) = extract_json_span(candidate) {
        if let Ok(value) = serde_json::from_str::<T>(span) {
            return Ok(value);
        }
    }
    Err(ParseError {
        raw_head: raw.chars().take(200).collect(),
    })
}

fn strip_fence(s: &str) -> &str {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else if let Some(rest) = s.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        s
    }
}

fn extract_json_span(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let open = s.as_bytes()[start];
    let close = if open == b'{' { b'}' } else { b']' };
    let end = s.as_bytes().iter().rposition(|&b| b == close)?;
    if end <= start {
        return None;
    }
    Some(&s[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        ok: bool,
    }

    struct ScriptedClient {
        responses: std::sync::Mutex<Vec<Result<String, LlmError>>>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, _prompt: &str) -> Result<crate::llm::client::LlmCompletion, LlmError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut responses = self.responses.lock().unwrap();
            match responses.remove(0) {
                Ok(content) => Ok(crate::llm::client::LlmCompletion {
                    content,
                    usage: TokenUsage::estimate_from_words(5, 5),
                }),
                Err(e) => Err(e),
            }
        }

        fn model_name(&self) -> &str {
            "scripted-test-model"
        }
    }

    #[tokio::test]
    async fn blocked_response_never_retries() {
        let client = Arc::new(ScriptedClient {
            responses: std::sync::Mutex::new(vec![Err(LlmError::Blocked("safety".into()))]),
            calls: AtomicU32::new(0),
        });
        let gateway = LlmGateway::new(client.clone(), 3, 0);
        let result = gateway.generate("prompt").await;
        assert!(matches!(result, Err(LlmError::Blocked(_))));
        assert_eq!(client.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn transport_error_retries_until_success() {
        let client = Arc::new(ScriptedClient {
            responses: std::sync::Mutex::new(vec![
                Err(LlmError::Transport("timeout".into())),
                Ok("{\"ok\": true}".to_string()),
            ]),
            calls: AtomicU32::new(0),
        });
        let gateway = LlmGateway::new(client.clone(), 3, 0);
        let response = gateway.generate("prompt").await.unwrap();
        assert_eq!(response.attempts, 2);
        assert_eq!(client.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn generate_json_salvages_fenced_block() {
        let client = Arc::new(ScriptedClient {
            responses: std::sync::Mutex::new(vec![Ok(
                "Sure thing, here you go:\n```json\n{\"ok\": true}\n```\nhope that helps".to_string(),
            )]),
            calls: AtomicU32::new(0),
        });
        let gateway = LlmGateway::new(client, 3, 0);
        let (payload, _usage) = gateway.generate_json::<Payload>("prompt").await.unwrap();
        assert_eq!(payload, Payload { ok: true });
    }

    #[tokio::test]
    async fn generate_json_reports_parse_error_on_garbage() {
        let client = Arc::new(ScriptedClient {
            responses: std::sync::Mutex::new(vec![Ok("not json at all".to_string())]),
            calls: AtomicU32::new(0),
        });
        let gateway = LlmGateway::new(client, 3, 0);
        let result = gateway.generate_json::<Payload>("prompt").await;
        assert!(matches!(result, Err(LlmGatewayJsonError::Parse(_))));
    }
}
