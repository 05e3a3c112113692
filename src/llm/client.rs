//! Provider-agnostic LLM client abstraction.
//!
//! A [`LlmClient`] speaks to exactly one upstream provider and knows nothing
//! about retries, rate limits, or JSON salvage — that policy lives one layer
//! up in [`LlmGateway`](crate::llm::gateway::LlmGateway), keeping "one
//! provider call" and "conversation/retry policy" as separate concerns.

use async_trait::async_trait;

use crate::error::LlmError;

/// How many tokens a single call spent, reported by the provider when it
/// tells the truth and estimated by the gateway otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    /// `true` when the provider did not report token counts and the gateway
    /// derived this value from `ceil(word_count * 1.3)`.
    pub estimated: bool,
}

impl TokenUsage {
    pub fn estimate_from_words(input_words: usize, output_words: usize) -> Self {
        let input_tokens = ((input_words as f64) * 1.3).ceil() as u32;
        let output_tokens = ((output_words as f64) * 1.3).ceil() as u32;
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated: true,
        }
    }

    pub fn reported(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated: false,
        }
    }
}

/// A completed generation from the provider, before JSON salvage.
#[derive(Debug, Clone)]
pub struct LlmCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

/// One upstream provider's chat-completion call, stripped of retry policy.
///
/// Implementations must be `Send + Sync` so a single client can be shared
/// across the concurrent lead workers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as a single user turn and return the raw completion.
    /// Implementations map provider-specific failures onto [`LlmError`]:
    /// safety blocks to `Blocked`, 429s to `RateLimited`, everything else
    /// transport-shaped to `Transport`.
    async fn complete(&self, prompt: &str) -> Result<LlmCompletion, LlmError>;

    /// Identifier for the model backing this client, used in stage metrics
    /// and log lines (e.g. `"gemini-1.5-flash-latest"`).
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_rounds_up() {
        let usage = TokenUsage::estimate_from_words(10, 0);
        assert_eq!(usage.input_tokens, 13);
        assert!(usage.estimated);
    }

    #[test]
    fn reported_usage_is_not_marked_estimated() {
        let usage = TokenUsage::reported(100, 50);
        assert_eq!(usage.total_tokens, 150);
        assert!(!usage.estimated);
    }
}
