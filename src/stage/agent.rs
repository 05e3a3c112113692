//! The stage agent execution contract and the generic
//! LLM-JSON stage implementation every catalog entry is built from.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::PipelineConfig;
use crate::domain::{EnrichedContext, LeadState, StageMetrics, StageRecord};
use crate::event::{Event, EventEnvelope};
use crate::llm::gateway::{LlmGateway, LlmGatewayJsonError};
use crate::rag::RagStore;
use crate::search::{ScrapeClient, SearchClient};

/// Grouping used for registry bookkeeping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCategory {
    Initial,
    Orchestrator,
    Specialized,
    Alternative,
}

/// Handles to every collaborator a stage is allowed to call, bundled so the
/// DAG executor can pass one reference instead of five.
pub struct StageContext {
    pub gateway: Arc<LlmGateway>,
    pub search: Option<Arc<dyn SearchClient>>,
    pub scrape: Option<Arc<dyn ScrapeClient>>,
    pub rag: Arc<RagStore>,
    pub config: Arc<PipelineConfig>,
    pub job_id: String,
    pub user_id: String,
}

/// What running one stage produces: the record to store on [`LeadState`],
/// its metrics, the events to forward on the job's event stream, and any
/// text chunks to feed back into the RAG store.
pub struct StageRunOutcome {
    pub record: StageRecord,
    pub metrics: StageMetrics,
    pub events: Vec<Event>,
    pub rag_chunks: Vec<String>,
    /// `true` when this stage queried the RAG store and got back a
    /// keyword-overlap-degraded result.
    pub rag_degraded: bool,
}

/// One node in the lead-enrichment DAG.
#[async_trait]
pub trait StageAgent: Send + Sync {
    fn name(&self) -> &'static str;
    fn category(&self) -> StageCategory;
    fn dependencies(&self) -> &'static [&'static str];
    fn execution_order(&self) -> u32;

    async fn run(
        &self,
        ctx: &StageContext,
        enriched: &EnrichedContext,
        state: &LeadState,
    ) -> StageRunOutcome;
}

/// Generic stage body shared by every catalog entry. Parameterized over typed
/// Input/Output so the registry holds one concrete type per stage while the
/// control flow — render, call, parse, default-on-failure, record metrics —
/// is written exactly once.
pub struct LlmJsonStage<O> {
    pub name: &'static str,
    pub category: StageCategory,
    pub dependencies: &'static [&'static str],
    pub execution_order: u32,
    /// Builds the rendered prompt from the lead's accumulated state plus
    /// whatever the RAG store returned for `rag_query` (empty if the stage
    /// doesn't consult it or the store had nothing yet).
    pub render_prompt: Box<dyn Fn(&StageContext, &EnrichedContext, &LeadState, &[String]) -> String + Send + Sync>,
    /// The stage-specific default emitted when the call or the parse fails.
    pub default_output: Box<dyn Fn(&LeadState) -> O + Send + Sync>,
    /// Query text to consult the RAG store with before rendering the prompt,
    /// or `None` for stages that don't need retrieved context.
    pub rag_query: Box<dyn Fn(&LeadState) -> Option<String> + Send + Sync>,
    /// Text to append to the RAG store when the stage succeeds (possibly
    /// empty). Returns nothing for stages that don't feed the RAG store.
    pub rag_chunks: Box<dyn Fn(&O) -> Vec<String> + Send + Sync>,
    /// Deterministic override applied after the LLM call/parse resolves,
    /// for stages whose output must follow a fixed rule rather than
    /// whatever the model returned. Identity for most stages.
    pub postprocess: Box<dyn Fn(&LeadState, O, Option<String>) -> (O, Option<String>) + Send + Sync>,
}

#[async_trait]
impl<O> StageAgent for LlmJsonStage<O>
where
    O: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> StageCategory {
        self.category
    }

    fn dependencies(&self) -> &'static [&'static str] {
        self.dependencies
    }

    fn execution_order(&self) -> u32 {
        self.execution_order
    }

    async fn run(
        &self,
        ctx: &StageContext,
        enriched: &EnrichedContext,
        state: &LeadState,
    ) -> StageRunOutcome {
        let envelope = EventEnvelope::new(ctx.job_id.clone(), ctx.user_id.clone());
        let started_at = Utc::now();
        let clock = Instant::now();

        let (rag_context, rag_degraded) = match (self.rag_query)(state) {
            Some(query_text) => {
                let result = ctx.rag.query(&ctx.job_id, &query_text, 3).await;
                (result.hits.into_iter().map(|(chunk, _score)| chunk).collect(), result.degraded)
            }
            None => (Vec::new(), false),
        };

        let prompt = (self.render_prompt)(ctx, enriched, state, &rag_context);
        let truncated_prompt = truncate_to_budget(&prompt, ctx.config.llm_max_prompt_characters);

        let start_event = Event::AgentStart {
            envelope: envelope.clone(),
            agent_name: self.name.to_string(),
            agent_description: format!("stage `{}`", self.name),
            input_query: preview(&truncated_prompt, 200),
        };

        let (output, error_message, tokens, llm_call_count) =
            match ctx.gateway.generate_json::<O>(&truncated_prompt).await {
                Ok((value, usage)) => (value, None, Some(usage), 1u32),
                Err(LlmGatewayJsonError::Llm(e)) => ((self.default_output)(state), Some(e.to_string()), None, 1),
                Err(LlmGatewayJsonError::Parse(e)) => ((self.default_output)(state), Some(e.to_string()), None, 1),
            };
        let (output, error_message) = (self.postprocess)(state, output, error_message);

        let ended_at = Utc::now();
        let duration_ms = clock.elapsed().as_millis() as u64;
        let success = error_message.is_none();

        let payload = serde_json::to_value(&output).unwrap_or(serde_json::Value::Null);
        let rag_chunks = if success { (self.rag_chunks)(&output) } else { Vec::new() };

        let end_event = Event::AgentEnd {
            envelope,
            agent_name: self.name.to_string(),
            execution_time_seconds: duration_ms as f64 / 1000.0,
            success,
            final_response: Some(preview(&payload.to_string(), 200)),
            error_message: error_message.clone(),
        };

        StageRunOutcome {
            record: StageRecord {
                payload,
                error_message,
            },
            metrics: StageMetrics {
                stage_name: self.name.to_string(),
                started_at,
                ended_at,
                duration_ms,
                success,
                error_message: None,
                tokens,
                llm_call_count,
            },
            events: vec![start_event, end_event],
            rag_chunks,
            rag_degraded,
        }
    }
}

/// Truncate `text` to at most `max_characters`, never splitting inside a
/// multi-byte UTF-8 sequence.
pub fn truncate_to_budget(text: &str, max_characters: usize) -> String {
    if text.chars().count() <= max_characters {
        return text.to_string();
    }
    text.chars().take(max_characters).collect()
}

fn preview(text: &str, max_characters: usize) -> String {
    truncate_to_budget(text, max_characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusinessContext, Lead};
    use crate::llm::client::{LlmClient, LlmCompletion, TokenUsage};

    struct AlwaysJsonClient;

    #[async_trait]
    impl LlmClient for AlwaysJsonClient {
        async fn complete(&self, _prompt: &str) -> Result<LlmCompletion, crate::error::LlmError> {
            Ok(LlmCompletion {
                content: "{}".to_string(),
                usage: TokenUsage::estimate_from_words(12, 6),
            })
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    #[tokio::test]
    async fn a_successful_call_records_the_gateway_s_token_usage() {
        let ctx = StageContext {
            gateway: Arc::new(LlmGateway::new(Arc::new(AlwaysJsonClient), 1, 0)),
            search: None,
            scrape: None,
            rag: Arc::new(RagStore::new(None)),
            config: Arc::new(PipelineConfig::default()),
            job_id: "job-agent-1".to_string(),
            user_id: "user-1".to_string(),
        };
        let enriched = EnrichedContext::new("job-agent-1", BusinessContext::default(), "query".to_string());
        let state = LeadState::new(Lead::fallback("job-agent-1"));

        let stage = LlmJsonStage::<serde_json::Value> {
            name: "probe",
            category: StageCategory::Specialized,
            dependencies: &[],
            execution_order: 0,
            render_prompt: Box::new(|_ctx, _enriched, _state, _rag_context| "prompt".to_string()),
            default_output: Box::new(|_state| serde_json::json!({})),
            rag_query: Box::new(|_state| None),
            postprocess: Box::new(|_state, output, error_message| (output, error_message)),
            rag_chunks: Box::new(|_output| vec![]),
        };

        let outcome = stage.run(&ctx, &enriched, &state).await;
        let tokens = outcome.metrics.tokens.expect("successful call should record usage");
        assert_eq!(tokens.total_tokens, TokenUsage::estimate_from_words(12, 6).total_tokens);
        assert_eq!(outcome.metrics.llm_call_count, 1);
    }

    #[test]
    fn truncate_to_budget_is_a_no_op_under_the_cap() {
        assert_eq!(truncate_to_budget("short", 100), "short");
    }

    #[test]
    fn truncate_to_budget_cuts_on_character_boundaries() {
        let text = "héllo wörld";
        let truncated = truncate_to_budget(text, 3);
        assert_eq!(truncated.chars().count(), 3);
    }
}
