//! `internal_briefing`: the sales-facing digest of the whole DAG run. Runs
//! last — its prompt draws from nearly every prior stage's output rather
//! than one or two typed dependencies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::detailed_plan::{self, DetailedPlanOutput};
use super::lead_qualification::{self, LeadQualificationOutput};
use super::objection_handling::{self, ObjectionHandlingOutput};
use super::personalized_message::{self, PersonalizedMessageOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "internal_briefing";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InternalBriefingOutput {
    pub executive_summary: String,
    pub profile_highlights: Vec<String>,
    pub approach_summary: String,
    pub engagement_overview: String,
    pub objections: Vec<String>,
    pub talking_points_for_sales: Vec<String>,
    pub next_steps: Vec<String>,
    pub final_notes: String,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<InternalBriefingOutput> {
        name: STAGE_NAME,
        category: StageCategory::Orchestrator,
        dependencies: &[
            lead_qualification::STAGE_NAME,
            detailed_plan::STAGE_NAME,
            objection_handling::STAGE_NAME,
            personalized_message::STAGE_NAME,
        ],
        execution_order: 16,
        render_prompt: Box::new(|_ctx, _enriched, state, _rag_context| {
            let qualification = state
                .typed_output::<LeadQualificationOutput>(lead_qualification::STAGE_NAME)
                .unwrap_or_default();
            let plan = state
                .typed_output::<DetailedPlanOutput>(detailed_plan::STAGE_NAME)
                .unwrap_or_default();
            let objections = state
                .typed_output::<ObjectionHandlingOutput>(objection_handling::STAGE_NAME)
                .unwrap_or_default();
            let message = state
                .typed_output::<PersonalizedMessageOutput>(personalized_message::STAGE_NAME)
                .unwrap_or_default();
            format!(
                "Write an internal briefing for the sales team about {}. Qualification tier: {:?} \
                 ({}). Plan objective: {}. Drafted channel: {}. Anticipated objection count: {}.\n\n\
                 Respond as JSON with keys: executive_summary, profile_highlights (array), \
                 approach_summary, engagement_overview, objections (array), \
                 talking_points_for_sales (array), next_steps (array), final_notes.",
                state.lead.company_name,
                qualification.tier,
                qualification.justification,
                plan.main_objective,
                message.channel,
                objections.objections.len(),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|state| InternalBriefingOutput {
            executive_summary: format!("Briefing unavailable for {}.", state.lead.company_name),
            ..InternalBriefingOutput::default()
        }),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
