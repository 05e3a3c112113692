//! `strategic_questions`: open-ended discovery questions for the first call.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisOutput};
use super::pain_point_deepening::{self, PainPointDeepeningOutput};
use crate::persona::derive_persona_profile;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "strategic_questions";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategicQuestionsOutput {
    pub questions: Vec<String>,
    pub category_map: HashMap<String, String>,
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<StrategicQuestionsOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[analysis::STAGE_NAME, pain_point_deepening::STAGE_NAME],
        execution_order: 7,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let analysis_output = state
                .typed_output::<AnalysisOutput>(analysis::STAGE_NAME)
                .unwrap_or_default();
            let pain_points = state
                .typed_output::<PainPointDeepeningOutput>(pain_point_deepening::STAGE_NAME)
                .unwrap_or_default();
            let persona = derive_persona_profile(&enriched.business_context, &analysis_output);
            format!(
                "Draft 3 to 5 open-ended discovery questions for a first sales call, given persona {} \
                 and primary pain category {}.\n\n\
                 Respond as JSON with keys: questions (array), category_map (object mapping each \
                 question to the topic it probes).",
                persona, pain_points.primary_pain_category,
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| StrategicQuestionsOutput::default()),
        postprocess: Box::new(|_state, output, error_message| (output, error_message)),
        rag_chunks: Box::new(|_output| vec![]),
    })
}
