//! `tot_evaluate`: score each generated strategy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::tot_generate::{self, ToTGenerateOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "tot_evaluate";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyEvaluation {
    pub strategy_name: String,
    pub suitability: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvements: Vec<String>,
    pub confidence_label: String,
    pub confidence_justification: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToTEvaluateOutput {
    pub evaluations: Vec<StrategyEvaluation>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ToTEvaluateOutput> {
        name: STAGE_NAME,
        category: StageCategory::Orchestrator,
        dependencies: &[tot_generate::STAGE_NAME],
        execution_order: 10,
        render_prompt: Box::new(|_ctx, _enriched, state, _rag_context| {
            let generated = state
                .typed_output::<ToTGenerateOutput>(tot_generate::STAGE_NAME)
                .unwrap_or_default();
            let names: Vec<&str> = generated.strategies.iter().map(|s| s.name.as_str()).collect();
            format!(
                "Evaluate each of these outreach strategies for {}: {}. For each, assess suitability, \
                 strengths, weaknesses, and concrete improvements.\n\n\
                 Respond as JSON with key: evaluations (array of {{strategy_name, suitability, \
                 strengths (array), weaknesses (array), improvements (array), confidence_label, \
                 confidence_justification}}).",
                state.lead.company_name,
                names.join(", "),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ToTEvaluateOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
