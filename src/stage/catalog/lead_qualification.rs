//! `lead_qualification`: tiering decision fed by analysis, persona, and pain
//! points.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisOutput};
use super::pain_point_deepening::{self, PainPointDeepeningOutput};
use crate::persona::derive_persona_profile;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "lead_qualification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationTier {
    High,
    Medium,
    Low,
    NotQualified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadQualificationOutput {
    pub tier: QualificationTier,
    pub confidence: f64,
    pub justification: String,
    pub positive_signals: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
}

impl Default for LeadQualificationOutput {
    fn default() -> Self {
        Self {
            tier: QualificationTier::NotQualified,
            confidence: 0.0,
            justification: "qualification could not be completed".to_string(),
            positive_signals: vec![],
            risks: vec![],
            next_steps: vec![],
        }
    }
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<LeadQualificationOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[analysis::STAGE_NAME, pain_point_deepening::STAGE_NAME],
        execution_order: 5,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let analysis_output = state
                .typed_output::<AnalysisOutput>(analysis::STAGE_NAME)
                .unwrap_or_default();
            let pain_points = state
                .typed_output::<PainPointDeepeningOutput>(pain_point_deepening::STAGE_NAME)
                .unwrap_or_default();
            let persona = derive_persona_profile(&enriched.business_context, &analysis_output);
            format!(
                "Qualify this lead for outreach.\nDiagnosis: {}\nPersona: {}\nPrimary pain category: {}\n\
                 Pain point count: {}\n\n\
                 Respond as JSON with keys: tier (one of high/medium/low/not_qualified), confidence (0..1), \
                 justification, positive_signals (array), risks (array), next_steps (array).",
                analysis_output.general_diagnosis,
                persona,
                pain_points.primary_pain_category,
                pain_points.detailed_pain_points.len(),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| LeadQualificationOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
