//! Deterministic buyer-persona profile derivation (SPEC_FULL §2).
//!
//! The original pipeline ran a dedicated LLM agent to invent buyer personas.
//! Several downstream stages (`pain_point_deepening`, `lead_qualification`,
//! `strategic_questions`) only ever consume the persona as a short profile
//! string folded into their own prompts, so this crate derives it directly
//! from already-computed data — one fewer LLM round trip per lead, and a
//! value every downstream stage can read without waiting on a call that can
//! fail.

use crate::domain::BusinessContext;
use crate::stage::catalog::analysis::AnalysisOutput;

/// Build the persona-profile string handed to downstream stage prompts.
pub fn derive_persona_profile(business_context: &BusinessContext, analysis: &AnalysisOutput) -> String {
    let ideal_customer = business_context
        .ideal_customer
        .as_deref()
        .unwrap_or("a relevant decision-maker");

    format!(
        "Likely buyer: {}. Operates in the {} sector at a company sized {}. \
         Cares about: {}. Primary friction today: {}.",
        ideal_customer,
        analysis.sector,
        analysis.size_estimate,
        analysis.opportunity_fit,
        analysis.potential_challenges.join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::catalog::analysis::AnalysisOutput;

    #[test]
    fn persona_profile_prefers_explicit_ideal_customer() {
        let bc = BusinessContext {
            ideal_customer: Some("VP of Sales at mid-market SaaS".to_string()),
            ..Default::default()
        };
        let analysis = AnalysisOutput {
            sector: "SaaS".to_string(),
            main_services: vec!["CRM".to_string()],
            recent_activities: vec![],
            potential_challenges: vec!["manual outreach".to_string()],
            size_estimate: "51-200 employees".to_string(),
            culture: "fast-moving".to_string(),
            relevance_score: 0.7,
            general_diagnosis: "promising".to_string(),
            opportunity_fit: "automation upsell".to_string(),
        };
        let profile = derive_persona_profile(&bc, &analysis);
        assert!(profile.contains("VP of Sales at mid-market SaaS"));
        assert!(profile.contains("SaaS"));
        assert!(profile.contains("manual outreach"));
    }
}
