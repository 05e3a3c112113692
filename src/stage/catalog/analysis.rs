//! `analysis`: sector, services, and opportunity-fit read from the cleaned
//! intake text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::intake;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "analysis";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub sector: String,
    pub main_services: Vec<String>,
    pub recent_activities: Vec<String>,
    pub potential_challenges: Vec<String>,
    pub size_estimate: String,
    pub culture: String,
    pub relevance_score: f64,
    pub general_diagnosis: String,
    pub opportunity_fit: String,
}

impl Default for AnalysisOutput {
    fn default() -> Self {
        Self {
            sector: "unidentified".to_string(),
            main_services: vec![],
            recent_activities: vec![],
            potential_challenges: vec![],
            size_estimate: "unidentified".to_string(),
            culture: "unidentified".to_string(),
            relevance_score: 0.0,
            general_diagnosis: "unidentified".to_string(),
            opportunity_fit: "unidentified".to_string(),
        }
    }
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<AnalysisOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[intake::STAGE_NAME],
        execution_order: 1,
        render_prompt: Box::new(|ctx, enriched, state, _rag_context| {
            let cleaned_text = state
                .typed_output::<intake::IntakeOutput>(intake::STAGE_NAME)
                .map(|o| o.cleaned_text)
                .unwrap_or_default();
            let budget = ctx.config.field_budget(STAGE_NAME, "cleaned_text", 6_000);
            format!(
                "Analyze the following company for a B2B sales team targeting {}. \
                 Company name: {}. Extracted site text:\n{}\n\n\
                 Respond as JSON with keys: sector, main_services (array), recent_activities (array), \
                 potential_challenges (array), size_estimate, culture, relevance_score (0..1), \
                 general_diagnosis, opportunity_fit.",
                enriched
                    .business_context
                    .ideal_customer
                    .as_deref()
                    .unwrap_or("their ideal customer"),
                state.lead.company_name,
                crate::stage::agent::truncate_to_budget(&cleaned_text, budget),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| AnalysisOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|output| {
            vec![format!(
                "Analysis: {} operates in {} with services: {}.",
                output.general_diagnosis,
                output.sector,
                output.main_services.join(", ")
            )]
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_unidentified_and_clamped() {
        let output = AnalysisOutput::default();
        assert_eq!(output.sector, "unidentified");
        assert_eq!(output.relevance_score, 0.0);
    }
}
