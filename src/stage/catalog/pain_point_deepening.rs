//! `pain_point_deepening`: detailed pain points and urgency, grounded in the
//! derived persona profile.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisOutput};
use crate::domain::UrgencyLevel;
use crate::persona::derive_persona_profile;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "pain_point_deepening";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedPainPoint {
    pub description: String,
    pub impact: String,
    pub solution_fit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainPointDeepeningOutput {
    pub primary_pain_category: String,
    pub detailed_pain_points: Vec<DetailedPainPoint>,
    pub urgency: UrgencyLevel,
    pub investigative_questions: Vec<String>,
}

impl Default for PainPointDeepeningOutput {
    fn default() -> Self {
        Self {
            primary_pain_category: "unidentified".to_string(),
            detailed_pain_points: vec![],
            urgency: UrgencyLevel::default(),
            investigative_questions: vec![],
        }
    }
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<PainPointDeepeningOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[analysis::STAGE_NAME],
        execution_order: 4,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let analysis_output = state
                .typed_output::<AnalysisOutput>(analysis::STAGE_NAME)
                .unwrap_or_default();
            let persona = derive_persona_profile(&enriched.business_context, &analysis_output);
            format!(
                "Given this company analysis and buyer persona, deepen the pain points a sales rep \
                 should raise.\nCompany diagnosis: {}\nOpportunity fit: {}\nPersona: {}\n\n\
                 Respond as JSON with keys: primary_pain_category, detailed_pain_points (array of \
                 {{description, impact, solution_fit}}), urgency (one of low/medium/high/critical), \
                 investigative_questions (array).",
                analysis_output.general_diagnosis, analysis_output.opportunity_fit, persona,
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| PainPointDeepeningOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
