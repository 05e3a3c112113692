//! `tavily_enrichment`: external-intelligence lookups via the search
//! collaborator. The only catalog stage besides `intake`
//! that doesn't go through the LLM Gateway — it fans out a handful of
//! search queries and folds the snippets into a summary.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::analysis::{self, AnalysisOutput};
use crate::domain::{EnrichedContext, LeadState, StageMetrics, StageRecord};
use crate::event::{Event, EventEnvelope};
use crate::stage::agent::{StageAgent, StageCategory, StageContext, StageRunOutcome};

pub const STAGE_NAME: &str = "tavily_enrichment";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TavilyEnrichmentOutput {
    pub enrichment_summary: String,
    pub key_findings: Vec<String>,
    pub api_called: bool,
}

pub struct TavilyEnrichmentStage;

#[async_trait]
impl StageAgent for TavilyEnrichmentStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn category(&self) -> StageCategory {
        StageCategory::Specialized
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[analysis::STAGE_NAME]
    }

    fn execution_order(&self) -> u32 {
        2
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
            agent_description: "stage `tavily_enrichment`".to_string(),
            input_query: state.lead.company_name.clone(),
        };

        let analysis_output = state.typed_output::<AnalysisOutput>(analysis::STAGE_NAME);

        let (output, error_message) = match &ctx.search {
            Some(search) => {
                let queries = build_queries(&state.lead.company_name, analysis_output.as_ref());
                let mut findings = Vec::new();
                let mut any_call_succeeded = false;
                for query in queries.iter().take(ctx.config.tavily_total_queries_per_lead) {
                    match search.search(query, ctx.config.search_max_results_per_query).await {
                        Ok(results) => {
                            any_call_succeeded = true;
                            findings.extend(results.into_iter().map(|r| format!("{}: {}", r.title, r.snippet)));
                        }
                        Err(_) => continue,
                    }
                }
                if any_call_succeeded {
                    let summary = if findings.is_empty() {
                        format!("No additional external intelligence found for {}.", state.lead.company_name)
                    } else {
                        findings.join(" | ")
                    };
                    (
                        TavilyEnrichmentOutput {
                            enrichment_summary: summary,
                            key_findings: findings,
                            api_called: true,
                        },
                        None,
                    )
                } else {
                    (
                        TavilyEnrichmentOutput {
                            enrichment_summary: String::new(),
                            key_findings: vec![],
                            api_called: false,
                        },
                        Some("all search queries failed".to_string()),
                    )
                }
            }
            None => (
                TavilyEnrichmentOutput {
                    enrichment_summary: String::new(),
                    key_findings: vec![],
                    api_called: false,
                },
                Some("no search client configured".to_string()),
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
            final_response: Some(output.enrichment_summary.chars().take(200).collect()),
            error_message: error_message.clone(),
        };

        let rag_chunks = if success && !output.enrichment_summary.is_empty() {
            vec![format!("External intelligence: {}", output.enrichment_summary)]
        } else {
            vec![]
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
            rag_chunks,
            rag_degraded: false,
        }
    }
}

fn build_queries(company_name: &str, analysis: Option<&AnalysisOutput>) -> Vec<String> {
    let sector = analysis.map(|a| a.sector.clone()).unwrap_or_default();
    vec![
        format!("{} company overview", company_name),
        format!("{} {} news", company_name, sector),
        format!("{} contact decision makers", company_name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_queries_folds_in_sector_when_known() {
        let analysis = AnalysisOutput {
            sector: "fintech".to_string(),
            ..AnalysisOutput::default()
        };
        let queries = build_queries("Acme", Some(&analysis));
        assert!(queries.iter().any(|q| q.contains("fintech")));
    }
}
