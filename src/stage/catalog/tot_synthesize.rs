//! `tot_synthesize`: collapse the evaluated strategies into one chosen plan.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::tot_evaluate::{self, ToTEvaluateOutput};
use super::tot_generate::{self, ToTGenerateOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "tot_synthesize";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub name: String,
    pub summary: String,
    pub key_steps: Vec<String>,
    pub primary_channel: String,
    pub tone: String,
    pub main_value_prop: String,
    pub confidence: f64,
    pub impact: String,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToTSynthesizeOutput {
    pub chosen_plan: ActionPlan,
}

impl Default for ToTSynthesizeOutput {
    fn default() -> Self {
        Self {
            chosen_plan: ActionPlan {
                name: "minimal viable outreach".to_string(),
                summary: "Send a short, generic introductory message.".to_string(),
                key_steps: vec!["Send introductory email".to_string()],
                primary_channel: "email".to_string(),
                tone: "neutral".to_string(),
                main_value_prop: "unidentified".to_string(),
                confidence: 0.0,
                impact: "low".to_string(),
                justification: "synthesis could not be completed".to_string(),
            },
        }
    }
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ToTSynthesizeOutput> {
        name: STAGE_NAME,
        category: StageCategory::Orchestrator,
        dependencies: &[tot_evaluate::STAGE_NAME, tot_generate::STAGE_NAME],
        execution_order: 11,
        render_prompt: Box::new(|_ctx, _enriched, state, _rag_context| {
            let generated = state
                .typed_output::<ToTGenerateOutput>(tot_generate::STAGE_NAME)
                .unwrap_or_default();
            let evaluated = state
                .typed_output::<ToTEvaluateOutput>(tot_evaluate::STAGE_NAME)
                .unwrap_or_default();
            format!(
                "Choose exactly one outreach strategy for {} from these candidates: {}. \
                 Evaluations: {}.\n\n\
                 Respond as JSON with key: chosen_plan ({{name, summary, key_steps (array), \
                 primary_channel, tone, main_value_prop, confidence (0..1), impact, justification}}).",
                state.lead.company_name,
                generated.strategies.iter().map(|s| s.name.clone()).collect::<Vec<_>>().join(", "),
                evaluated.evaluations.iter().map(|e| format!("{}: {}", e.strategy_name, e.suitability)).collect::<Vec<_>>().join("; "),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ToTSynthesizeOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
