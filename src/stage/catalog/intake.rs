//! `intake`: fetch and clean the lead's landing page.
//!
//! The only catalog stage that doesn't call the LLM Gateway — it exists to
//! turn a bare URL into the cleaned text every later stage reads back out of
//! `LeadState` as "scraped text".

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::domain::{EnrichedContext, LeadState, StageMetrics, StageRecord};
use crate::event::{Event, EventEnvelope};
use crate::search::cleanup::clean_scraped_text;
use crate::stage::agent::{StageAgent, StageCategory, StageContext, StageRunOutcome};

pub const STAGE_NAME: &str = "intake";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeOutput {
    pub cleaned_text: String,
    pub extraction_success: bool,
}

pub struct IntakeStage;

#[async_trait]
impl StageAgent for IntakeStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn category(&self) -> StageCategory {
        StageCategory::Initial
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn execution_order(&self) -> u32 {
        0
    }

    async fn run(
        &self,
        ctx: &StageContext,
        _enriched: &EnrichedContext,
        state: &LeadState,
    ) -> StageRunOutcome {
        let envelope = EventEnvelope::new(ctx.job_id.clone(), ctx.user_id.clone());
        let started_at = Utc::now();
        let clock = Instant::now();

        let start_event = Event::AgentStart {
            envelope: envelope.clone(),
            agent_name: STAGE_NAME.to_string(),
            agent_description: "stage `intake`".to_string(),
            input_query: state.lead.website_url.clone(),
        };

        let (output, error_message) = match &ctx.scrape {
            Some(scraper) => match scraper.scrape(&state.lead.website_url).await {
                Ok(result) => (
                    IntakeOutput {
                        cleaned_text: clean_scraped_text(&result.text_content, ctx.config.scrape_max_characters),
                        extraction_success: true,
                    },
                    None,
                ),
                Err(e) => (
                    IntakeOutput {
                        cleaned_text: state.lead.initial_description.clone(),
                        extraction_success: false,
                    },
                    Some(e.to_string()),
                ),
            },
            None => (
                IntakeOutput {
                    cleaned_text: state.lead.initial_description.clone(),
                    extraction_success: false,
                },
                Some("no scrape client configured".to_string()),
            ),
        };

        let ended_at = Utc::now();
        let duration_ms = clock.elapsed().as_millis() as u64;
        let success = error_message.is_none();

        let end_event = Event::AgentEnd {
            envelope,
            agent_name: STAGE_NAME.to_string(),
            execution_time_seconds: duration_ms as f64 / 1000.0,
            success,
            final_response: Some(output.cleaned_text.chars().take(200).collect()),
            error_message: error_message.clone(),
        };

        StageRunOutcome {
            record: StageRecord {
                payload: serde_json::to_value(&output).unwrap_or(serde_json::Value::Null),
                error_message,
            },
            metrics: StageMetrics {
                stage_name: STAGE_NAME.to_string(),
                started_at,
                ended_at,
                duration_ms,
                success,
                error_message: None,
                tokens: None,
                llm_call_count: 0,
            },
            events: vec![start_event, end_event],
            rag_chunks: vec![],
            rag_degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_payload_carries_lead_description_on_no_scraper() {
        let output = IntakeOutput {
            cleaned_text: "Acme builds widgets".to_string(),
            extraction_success: false,
        };
        assert!(!output.extraction_success);
        assert!(output.cleaned_text.contains("Acme"));
    }
}
