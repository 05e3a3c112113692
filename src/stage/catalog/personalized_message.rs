//! `personalized_message`: the actual outreach draft.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::contact_extraction::{self, ContactExtractionOutput};
use super::detailed_plan;
use super::value_propositions::{self, ValuePropositionsOutput};
use crate::domain::LeadState;
use crate::stage::agent::{LlmJsonStage, StageAgent, StageCategory};

pub const STAGE_NAME: &str = "personalized_message";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedMessageOutput {
    pub channel: String,
    pub subject: Option<String>,
    pub body: String,
    pub cta: String,
    pub personalization_elements: Vec<String>,
}

impl Default for PersonalizedMessageOutput {
    fn default() -> Self {
        Self {
            channel: "none".to_string(),
            subject: None,
            body: String::new(),
            cta: String::new(),
            personalization_elements: vec![],
        }
    }
}

/// Deterministic contact-channel ladder: an extracted email wins, otherwise
/// fall back to a general inquiry through the lead's own site, otherwise
/// there is no channel at all. Never left to the model to decide.
fn resolve_channel(state: &LeadState) -> String {
    let contacts = state
        .typed_output::<ContactExtractionOutput>(contact_extraction::STAGE_NAME)
        .unwrap_or_default();
    if !contacts.emails.is_empty() {
        "email".to_string()
    } else if !state.lead.website_url.trim().is_empty() {
        "general_inquiry".to_string()
    } else {
        "none".to_string()
    }
}

pub fn build() -> Arc<dyn StageAgent> {
    Arc::new(LlmJsonStage::<PersonalizedMessageOutput> {
        name: STAGE_NAME,
        category: StageCategory::Specialized,
        dependencies: &[
            detailed_plan::STAGE_NAME,
            value_propositions::STAGE_NAME,
            contact_extraction::STAGE_NAME,
        ],
        execution_order: 15,
        render_prompt: Box::new(|_ctx, enriched, state, _rag_context| {
            let propositions = state
                .typed_output::<ValuePropositionsOutput>(value_propositions::STAGE_NAME)
                .unwrap_or_default();
            let contacts = state
                .typed_output::<ContactExtractionOutput>(contact_extraction::STAGE_NAME)
                .unwrap_or_default();
            let channel = resolve_channel(state);
            format!(
                "Draft a personalized outreach message to {} over {}, selling {}. \
                 Main value proposition: {}. Known contacts: emails={:?} phones={:?}.\n\n\
                 Respond as JSON with keys: channel, subject (string or null, only for email), body, \
                 cta, personalization_elements (array). Use exactly this channel: \"{}\" (the caller, \
                 not you, has already decided it).",
                state.lead.company_name,
                channel,
                enriched.business_context.product_service_description.as_deref().unwrap_or("our product"),
                propositions.propositions.first().map(|p| p.title.as_str()).unwrap_or("n/a"),
                contacts.emails,
                contacts.phones,
                channel,
            )
        }),
        rag_query: Box::new(|_state| None),
        default_output: Box::new(|_state| PersonalizedMessageOutput::default()),
        postprocess: Box::new(|state, mut output, error_message| {
            let channel = resolve_channel(state);
            output.channel = channel.clone();
            if channel != "email" {
                output.subject = None;
            }
            let error_message = if channel == "none" {
                Some(error_message.unwrap_or_else(|| "no contact channel available".to_string()))
            } else {
                error_message
            };
            (output, error_message)
        }),
        rag_chunks: Box::new(|_output| vec![]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Lead, LeadState, StageRecord};

    fn lead_state_with(website_url: &str, emails: Vec<String>) -> LeadState {
        let lead = Lead {
            lead_id: "lead-1".to_string(),
            company_name: "Acme".to_string(),
            website_url: website_url.to_string(),
            initial_description: "desc".to_string(),
        };
        let mut state = LeadState::new(lead);
        let contacts = ContactExtractionOutput {
            emails,
            ..ContactExtractionOutput::default()
        };
        state.record_output(
            contact_extraction::STAGE_NAME,
            StageRecord {
                payload: serde_json::to_value(&contacts).unwrap(),
                error_message: None,
            },
        );
        state
    }

    #[test]
    fn resolve_channel_prefers_an_extracted_email() {
        let state = lead_state_with("https://acme.example.com", vec!["sales@acme.example.com".to_string()]);
        assert_eq!(resolve_channel(&state), "email");
    }

    #[test]
    fn resolve_channel_falls_back_to_general_inquiry_without_an_email() {
        let state = lead_state_with("https://acme.example.com", vec![]);
        assert_eq!(resolve_channel(&state), "general_inquiry");
    }

    #[test]
    fn resolve_channel_is_none_with_no_email_and_no_site() {
        let state = lead_state_with("", vec![]);
        assert_eq!(resolve_channel(&state), "none");
    }
}
