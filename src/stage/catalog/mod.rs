//! The 17-stage catalog: nodes and edges of the lead
//! enrichment DAG.

pub mod analysis;
pub mod buying_triggers;
pub mod competitor_identification;
pub mod contact_extraction;
pub mod detailed_plan;
pub mod internal_briefing;
pub mod intake;
pub mod lead_qualification;
pub mod objection_handling;
pub mod pain_point_deepening;
pub mod personalized_message;
pub mod strategic_questions;
pub mod tavily_enrichment;
pub mod tot_evaluate;
pub mod tot_generate;
pub mod tot_synthesize;
pub mod value_propositions;

use std::sync::Arc;

use crate::stage::agent::StageAgent;

/// Build every catalog stage in execution order.
pub fn all_stages() -> Vec<Arc<dyn StageAgent>> {
    vec![
        Arc::new(intake::IntakeStage),
        analysis::build(),
        Arc::new(tavily_enrichment::TavilyEnrichmentStage),
        contact_extraction::build(),
        pain_point_deepening::build(),
        lead_qualification::build(),
        competitor_identification::build(),
        strategic_questions::build(),
        buying_triggers::build(),
        tot_generate::build(),
        tot_evaluate::build(),
        tot_synthesize::build(),
        detailed_plan::build(),
        objection_handling::build(),
        value_propositions::build(),
        personalized_message::build(),
        internal_briefing::build(),
    ]
}
