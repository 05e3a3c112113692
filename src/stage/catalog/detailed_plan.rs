//! `detailed_plan`: turn the chosen strategy into a concrete contact
//! sequence.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisOutput};
use super::pain_point_deepening::{self, PainPointDeepeningOutput};
use super::tot_synthesize::{self, ToTSynthesizeOutput};
use crate::persona::derive_persona_profile;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "detailed_plan";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactStep {
    pub channel: String,
    pub objective: String,
    pub key_topics: Vec<String>,
    pub key_questions: Vec<String>,
    pub cta: String,
    pub supporting_material: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedPlanOutput {
    pub main_objective: String,
    pub elevator_pitch: String,
    pub contact_sequence: Vec<ContactStep>,
    pub engagement_indicators: Vec<String>,
    pub obstacles: Vec<String>,
    pub success_next_steps: Vec<String>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<DetailedPlanOutput> {
        name: STAGE_NAME,
        category: StageCategory::Orchestrator,
        dependencies: &[
            tot_synthesize::STAGE_NAME,
            analysis::STAGE_NAME,
            pain_point_deepening::STAGE_NAME,
        ],
        execution_order: 12,
        render_prompt: Box::new(|_ctx, enriched, state, rag_context| {
            let plan = state
                .typed_output::<ToTSynthesizeOutput>(tot_synthesize::STAGE_NAME)
                .unwrap_or_default();
            let analysis_output = state
                .typed_output::<AnalysisOutput>(analysis::STAGE_NAME)
                .unwrap_or_default();
            let pain_points = state
                .typed_output::<PainPointDeepeningOutput>(pain_point_deepening::STAGE_NAME)
                .unwrap_or_default();
            let persona = derive_persona_profile(&enriched.business_context, &analysis_output);
            let retrieved = if rag_context.is_empty() {
                "none".to_string()
            } else {
                rag_context.join(" | ")
            };
            format!(
                "Turn this chosen strategy into a 3 to 4 step contact sequence for {}.\n\
                 Chosen plan: {} — {}\nPersona: {}\nPrimary pain category: {}\n\
                 Relevant prior context: {}\n\n\
                 Respond as JSON with keys: main_objective, elevator_pitch, contact_sequence \
                 (array of {{channel, objective, key_topics (array), key_questions (array), cta, \
                 supporting_material}}), engagement_indicators (array), obstacles (array), \
                 success_next_steps (array).",
                state.lead.company_name,
                plan.chosen_plan.name,
                plan.chosen_plan.summary,
                persona,
                pain_points.primary_pain_category,
                retrieved,
            )
        }),
        default_output: Box::new(|_state| DetailedPlanOutput::default()),
        rag_query: Box::new(|state| Some(format!("{} buying signals and context", state.lead.company_name))),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
