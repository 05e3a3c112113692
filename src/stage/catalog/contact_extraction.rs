//! `contact_extraction`: emails, phones, and social handles pulled from the
//! scraped text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{analysis, intake};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "contact_extraction";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactExtractionOutput {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub social_profiles: Vec<String>,
    pub search_suggestions: Vec<String>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<ContactExtractionOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[intake::STAGE_NAME, analysis::STAGE_NAME],
        execution_order: 3,
        render_prompt: Box::new(|ctx, _enriched, state, _rag_context| {
            let cleaned_text = state
                .typed_output::<intake::IntakeOutput>(intake::STAGE_NAME)
                .map(|o| o.cleaned_text)
                .unwrap_or_default();
            let budget = ctx.config.field_budget(STAGE_NAME, "cleaned_text", 6_000);
            format!(
                "Extract every contact channel you can find for {} from the text below. \
                 Respond as JSON with keys: emails (array), phones (array), social_profiles (array), \
                 search_suggestions (array of follow-up queries if contact info is thin).\n\n{}",
                state.lead.company_name,
                crate::stage::agent::truncate_to_budget(&cleaned_text, budget),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| ContactExtractionOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
