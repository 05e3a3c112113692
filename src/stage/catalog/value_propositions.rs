//! `value_propositions`: customized value propositions tying product to the
//! lead's pain points and triggers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisOutput};
use super::buying_triggers::{self, BuyingTriggersOutput};
use super::pain_point_deepening::{self, PainPointDeepeningOutput};
use crate::persona::derive_persona_profile;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "value_propositions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueProposition {
    pub title: String,
    pub detailed_proposition: String,
    pub key_benefits: Vec<String>,
    pub target_pain_or_trigger: String,
    pub evidence_suggestion: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuePropositionsOutput {
    pub propositions: Vec<ValueProposition>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ValuePropositionsOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[
            analysis::STAGE_NAME,
            pain_point_deepening::STAGE_NAME,
            buying_triggers::STAGE_NAME,
        ],
        execution_order: 14,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let analysis_output = state
                .typed_output::<AnalysisOutput>(analysis::STAGE_NAME)
                .unwrap_or_default();
            let pain_points = state
                .typed_output::<PainPointDeepeningOutput>(pain_point_deepening::STAGE_NAME)
                .unwrap_or_default();
            let triggers = state
                .typed_output::<BuyingTriggersOutput>(buying_triggers::STAGE_NAME)
                .unwrap_or_default();
            let persona = derive_persona_profile(&enriched.business_context, &analysis_output);
            format!(
                "Write 2 to 3 customized value propositions for {}, selling {}, for persona {}. \
                 Primary pain category: {}. Triggers: {}.\n\n\
                 Respond as JSON with key: propositions (array of {{title, detailed_proposition, \
                 key_benefits (array), target_pain_or_trigger, evidence_suggestion}}).",
                state.lead.company_name,
                enriched.business_context.product_service_description.as_deref().unwrap_or("our product"),
                persona,
                pain_points.primary_pain_category,
                triggers.triggers.iter().map(|t| t.description.clone()).collect::<Vec<_>>().join("; "),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ValuePropositionsOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
