//! `objection_handling`: anticipated objections and responses.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::detailed_plan::{self, DetailedPlanOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "objection_handling";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objection {
    pub category: String,
    pub statement: String,
    pub response_strategy: String,
    pub talking_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectionHandlingOutput {
    pub objections: Vec<Objection>,
    pub general_advice: String,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ObjectionHandlingOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[detailed_plan::STAGE_NAME],
        execution_order: 13,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let plan = state
                .typed_output::<DetailedPlanOutput>(detailed_plan::STAGE_NAME)
                .unwrap_or_default();
            format!(
                "Anticipate 3 to 5 objections {} might raise to our plan ({}), selling {}.\n\n\
                 Respond as JSON with keys: objections (array of {{category, statement, \
                 response_strategy, talking_points (array)}}), general_advice.",
                state.lead.company_name,
                plan.main_objective,
                enriched.business_context.product_service_description.as_deref().unwrap_or("our product"),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ObjectionHandlingOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
