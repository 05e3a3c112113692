//! Pure scoring functions over a completed [`LeadState`].
//!
//! These are fixed contracts: the arithmetic is tested numerically, not just
//! for shape. The `*_from_components` functions hold the formula exactly as
//! specified; [`confidence_score`], [`roi_potential_score`], and
//! [`engagement_readiness_score`] extract their inputs from a [`LeadState`]
//! and are the only place that derivation decision lives.

use crate::domain::LeadState;
use crate::stage::catalog::buying_triggers::{self, BuyingTriggersOutput};
use crate::stage::catalog::contact_extraction::{self, ContactExtractionOutput};
use crate::stage::catalog::lead_qualification::{self, LeadQualificationOutput};
use crate::stage::catalog::pain_point_deepening::{self, PainPointDeepeningOutput};
use crate::stage::catalog::tavily_enrichment::{self, TavilyEnrichmentOutput};
use crate::stage::catalog::tot_synthesize;
use crate::stage::catalog::value_propositions::{self, ValuePropositionsOutput};

/// Confidence formula, tested directly against scenario 5.
pub fn confidence_from_components(
    qualification_confidence: f64,
    detailed_pain_point_count: usize,
    contact_extraction_confidence: f64,
    enrichment_confidence: f64,
    action_plan_succeeded: bool,
) -> f64 {
    let score = 0.3
        + 0.2 * qualification_confidence
        + (0.05 * detailed_pain_point_count as f64).min(0.15)
        + 0.1 * contact_extraction_confidence
        + if enrichment_confidence > 0.5 { 0.1 } else { 0.05 }
        + if action_plan_succeeded { 0.15 } else { 0.05 };
    score.min(1.0).max(0.0)
}

/// ROI-potential formula.
pub fn roi_potential_from_components(
    qualification_confidence: f64,
    urgency_weight: f64,
    valid_value_proposition_count: usize,
    identified_trigger_count: usize,
) -> f64 {
    let score = 0.4 * qualification_confidence
        + 0.25 * urgency_weight
        + (0.1 * valid_value_proposition_count as f64).min(0.25)
        + (0.05 * identified_trigger_count as f64).min(0.10);
    score.min(1.0).max(0.0)
}

/// Engagement-readiness formula.
pub fn engagement_readiness_from_components(
    prospect_score: f64,
    urgency_score: f64,
    pain_alignment_score: f64,
    buying_intent_score: f64,
    personalized_message_failed: bool,
    detailed_plan_failed: bool,
) -> f64 {
    let mut score =
        0.25 * prospect_score + 0.25 * urgency_score + 0.25 * pain_alignment_score + 0.25 * buying_intent_score;
    if personalized_message_failed {
        score -= 0.1;
    }
    if detailed_plan_failed {
        score -= 0.1;
    }
    score.min(1.0).max(0.0)
}

fn contact_extraction_confidence(output: &ContactExtractionOutput) -> f64 {
    let populated = [
        !output.emails.is_empty(),
        !output.phones.is_empty(),
        !output.social_profiles.is_empty(),
    ]
    .iter()
    .filter(|populated| **populated)
    .count();
    populated as f64 / 3.0
}

fn enrichment_confidence(output: &TavilyEnrichmentOutput) -> f64 {
    if !output.api_called {
        return 0.0;
    }
    (output.key_findings.len() as f64 / 3.0).min(1.0)
}

fn action_plan_succeeded(state: &LeadState) -> bool {
    state
        .output(tot_synthesize::STAGE_NAME)
        .map(|record| record.error_message.is_none())
        .unwrap_or(false)
}

fn stage_failed(state: &LeadState, stage_name: &str) -> bool {
    state
        .output(stage_name)
        .map(|record| record.error_message.is_some())
        .unwrap_or(true)
}

/// Confidence score for a completed lead.
pub fn confidence_score(state: &LeadState) -> f64 {
    let qualification: LeadQualificationOutput = state
        .typed_output(lead_qualification::STAGE_NAME)
        .unwrap_or_default();
    let pain_points: PainPointDeepeningOutput = state
        .typed_output(pain_point_deepening::STAGE_NAME)
        .unwrap_or_default();
    let contacts: ContactExtractionOutput = state
        .typed_output(contact_extraction::STAGE_NAME)
        .unwrap_or_default();
    let enrichment: TavilyEnrichmentOutput = state
        .typed_output(tavily_enrichment::STAGE_NAME)
        .unwrap_or_default();

    confidence_from_components(
        qualification.confidence,
        pain_points.detailed_pain_points.len(),
        contact_extraction_confidence(&contacts),
        enrichment_confidence(&enrichment),
        action_plan_succeeded(state),
    )
}

/// ROI-potential score for a completed lead.
pub fn roi_potential_score(state: &LeadState) -> f64 {
    let qualification: LeadQualificationOutput = state
        .typed_output(lead_qualification::STAGE_NAME)
        .unwrap_or_default();
    let pain_points: PainPointDeepeningOutput = state
        .typed_output(pain_point_deepening::STAGE_NAME)
        .unwrap_or_default();
    let propositions: ValuePropositionsOutput = state
        .typed_output(value_propositions::STAGE_NAME)
        .unwrap_or_default();
    let triggers: BuyingTriggersOutput = state
        .typed_output(buying_triggers::STAGE_NAME)
        .unwrap_or_default();

    roi_potential_from_components(
        qualification.confidence,
        pain_points.urgency.roi_weight(),
        propositions.propositions.len(),
        triggers.triggers.len(),
    )
}

/// Engagement-readiness score for a completed lead. Absent
/// sub-scores substitute 0.5, per spec.
pub fn engagement_readiness_score(state: &LeadState) -> f64 {
    let qualification = state.typed_output::<LeadQualificationOutput>(lead_qualification::STAGE_NAME);
    let pain_points = state.typed_output::<PainPointDeepeningOutput>(pain_point_deepening::STAGE_NAME);
    let triggers = state.typed_output::<BuyingTriggersOutput>(buying_triggers::STAGE_NAME);

    let prospect_score = qualification.as_ref().map(|q| q.confidence).unwrap_or(0.5);
    let urgency_score = pain_points
        .as_ref()
        .map(|p| p.urgency.roi_weight() / UrgencyLevelMax::WEIGHT)
        .unwrap_or(0.5);
    let pain_alignment_score = pain_points
        .as_ref()
        .map(|p| (p.detailed_pain_points.len() as f64 / 3.0).min(1.0))
        .unwrap_or(0.5);
    let buying_intent_score = triggers
        .as_ref()
        .map(|t| (t.triggers.len() as f64 / 3.0).min(1.0))
        .unwrap_or(0.5);

    engagement_readiness_from_components(
        prospect_score,
        urgency_score,
        pain_alignment_score,
        buying_intent_score,
        stage_failed(state, "personalized_message"),
        stage_failed(state, "detailed_plan"),
    )
}

struct UrgencyLevelMax;
impl UrgencyLevelMax {
    const WEIGHT: f64 = 0.4;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UrgencyLevel;

    #[test]
    fn confidence_matches_scenario_five() {
        let confidence = confidence_from_components(0.8, 2, 0.4, 0.6, true);
        assert!((confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn confidence_clamps_at_one() {
        let confidence = confidence_from_components(1.0, 10, 1.0, 1.0, true);
        assert!(confidence <= 1.0);
    }

    #[test]
    fn roi_potential_clamps_and_weights_urgency() {
        let low = roi_potential_from_components(0.5, UrgencyLevel::Low.roi_weight(), 1, 1);
        let critical = roi_potential_from_components(0.5, UrgencyLevel::Critical.roi_weight(), 1, 1);
        assert!(low < critical);
        assert!(critical <= 1.0);
    }

    #[test]
    fn engagement_readiness_applies_both_penalties() {
        let base = engagement_readiness_from_components(1.0, 1.0, 1.0, 1.0, false, false);
        let penalized = engagement_readiness_from_components(1.0, 1.0, 1.0, 1.0, true, true);
        assert!((base - 1.0).abs() < 1e-9);
        assert!((penalized - 0.8).abs() < 1e-9);
    }
}
