//! `buying_triggers`: events or signals that make outreach timely.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::tavily_enrichment::{self, TavilyEnrichmentOutput};
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "buying_triggers";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyingTrigger {
    pub description: String,
    pub relevance_explanation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyingTriggersOutput {
    pub triggers: Vec<BuyingTrigger>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<BuyingTriggersOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[tavily_enrichment::STAGE_NAME],
        execution_order: 8,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let enrichment = state
                .typed_output::<TavilyEnrichmentOutput>(tavily_enrichment::STAGE_NAME)
                .unwrap_or_default();
            format!(
                "Identify buying triggers for {} — recent events or conditions that make outreach \
                 timely — using this external intelligence: {}. Our product: {}.\n\n\
                 Respond as JSON with key: triggers (array of {{description, relevance_explanation}}).",
                state.lead.company_name,
                enrichment.enrichment_summary,
                enriched.business_context.product_service_description.as_deref().unwrap_or("n/a"),
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| BuyingTriggersOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
