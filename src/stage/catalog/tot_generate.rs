//! `tot_generate`: the first Tree-of-Thought stage — several distinct
//! outreach strategies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::buying_triggers::{self, BuyingTriggersOutput};
use super::lead_qualification::{self, LeadQualificationOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "tot_generate";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOption {
    pub name: String,
    pub description: String,
    pub hook: String,
    pub talking_points: Vec<String>,
    pub channel: String,
    pub tone: String,
    pub opening_question: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToTGenerateOutput {
    pub strategies: Vec<StrategyOption>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ToTGenerateOutput> {
        name: STAGE_NAME,
        category: StageCategory::Orchestrator,
        dependencies: &[lead_qualification::STAGE_NAME, buying_triggers::STAGE_NAME],
        execution_order: 9,
        render_prompt: Box::new(|_ctx, _enriched, state, _rag_context| {
            let qualification = state
                .typed_output::<LeadQualificationOutput>(lead_qualification::STAGE_NAME)
                .unwrap_or_default();
            let triggers = state
                .typed_output::<BuyingTriggersOutput>(buying_triggers::STAGE_NAME)
                .unwrap_or_default();
            format!(
                "Generate 3 to 4 distinct outreach strategies for {}, qualified as tier {:?} with \
                 justification: {}. Known triggers: {}.\n\n\
                 Respond as JSON with key: strategies (array of {{name, description, hook, \
                 talking_points (array), channel, tone, opening_question}}).",
                state.lead.company_name,
                qualification.tier,
                qualification.justification,
                triggers.triggers.iter().map(|t| t.description.clone()).collect::<Vec<_>>().join("; "),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ToTGenerateOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
