//! `competitor_identification`: competitors inferred from scraped text and
//! the caller's own known-competitor list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::intake;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "competitor_identification";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorEntry {
    pub name: String,
    pub description: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorIdentificationOutput {
    pub competitors: Vec<CompetitorEntry>,
    pub other_notes: String,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<CompetitorIdentificationOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[intake::STAGE_NAME],
        execution_order: 6,
        render_prompt: Box::new(|ctx, enriched, state, _rag_context| {
            let cleaned_text = state
                .typed_output::<intake::IntakeOutput>(intake::STAGE_NAME)
                .map(|o| o.cleaned_text)
                .unwrap_or_default();
            let budget = ctx.config.field_budget(STAGE_NAME, "cleaned_text", 6_000);
            format!(
                "Identify competitors to {} given our product context: {}. Known competitors we're \
                 already aware of: {}. Company text:\n{}\n\n\
                 Respond as JSON with keys: competitors (array of {{name, description, strengths, \
                 weaknesses}}), other_notes.",
                state.lead.company_name,
                enriched.business_context.product_service_description.as_deref().unwrap_or("n/a"),
                enriched.business_context.competitors_list.join(", "),
                crate::stage::agent::truncate_to_budget(&cleaned_text, budget),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| CompetitorIdentificationOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
