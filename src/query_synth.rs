//! Query synthesis: turn a [`BusinessContext`] into a search
//! query string, preferring an LLM call with a deterministic fallback.

use crate::domain::BusinessContext;
use crate::llm::gateway::LlmGateway;

const STOPWORDS: &[&str] = &["the", "a", "and", "or", "of", "for", "to", "with", "in", "on", "at"];
const MAX_FALLBACK_TOKENS: usize = 10;
const FINAL_FALLBACK_QUERY: &str = "B2B prospective customers";

/// Synthesize a search query: try the LLM path first, fall back to the
/// deterministic keyword extractor on an empty/whitespace response or any
/// gateway error.
pub async fn synthesize_query(gateway: &LlmGateway, business_context: &BusinessContext) -> String {
    let prompt = render_prompt(business_context);
    match gateway.generate(&prompt).await {
        Ok(response) if !response.content.trim().is_empty() => {
            first_line(&response.content)
        }
        _ => deterministic_fallback_query(business_context),
    }
}

fn render_prompt(business_context: &BusinessContext) -> String {
    format!(
        "Given this business context, produce a single short web search query (one line, no \
         quotes, no explanation) that would surface prospective B2B customers.\n\
         Business description: {}\nProduct/service: {}\nIdeal customer: {}\nIndustry focus: {}\n\
         Location: {}",
        business_context.business_description.as_deref().unwrap_or("n/a"),
        business_context.product_service_description.as_deref().unwrap_or("n/a"),
        business_context.ideal_customer.as_deref().unwrap_or("n/a"),
        business_context.industry_focus.join(", "),
        business_context.location.as_deref().unwrap_or("n/a"),
    )
}

fn first_line(content: &str) -> String {
    content.lines().next().unwrap_or(content).trim().to_string()
}

/// Deterministic fallback: extract keywords from
/// the priority-ordered fields, tokenize, drop short tokens and stopwords,
/// dedupe preserving order, cap at 10 tokens.
pub fn deterministic_fallback_query(business_context: &BusinessContext) -> String {
    let mut source_fields: Vec<String> = Vec::new();
    source_fields.extend(business_context.industry_focus.iter().cloned());
    if let Some(v) = &business_context.product_service_description {
        source_fields.push(v.clone());
    }
    if let Some(v) = &business_context.ideal_customer {
        source_fields.push(v.clone());
    }
    if let Some(v) = &business_context.location {
        source_fields.push(v.clone());
    }
    if let Some(first_pain_point) = business_context.pain_points.first() {
        source_fields.push(first_pain_point.clone());
    }
    if let Some(v) = &business_context.user_search_query {
        source_fields.push(v.clone());
    }

    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();
    for field in &source_fields {
        for raw_token in tokenize(field) {
            if raw_token.len() <= 3 {
                continue;
            }
            if STOPWORDS.contains(&raw_token.as_str()) {
                continue;
            }
            if seen.insert(raw_token.clone()) {
                tokens.push(raw_token);
            }
            if tokens.len() >= MAX_FALLBACK_TOKENS {
                break;
            }
        }
        if tokens.len() >= MAX_FALLBACK_TOKENS {
            break;
        }
    }

    if tokens.is_empty() {
        FINAL_FALLBACK_QUERY.to_string()
    } else {
        tokens.join(" ")
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_drops_short_tokens_and_stopwords() {
        let bc = BusinessContext {
            product_service_description: Some("AI sales automation for the mid market".to_string()),
            ..Default::default()
        };
        let query = deterministic_fallback_query(&bc);
        assert!(!query.contains(" a "));
        assert!(!query.split_whitespace().any(|t| t == "for" || t == "the"));
        assert!(query.contains("sales"));
    }

    #[test]
    fn fallback_is_deterministic_for_identical_input() {
        let bc = BusinessContext {
            industry_focus: vec!["SaaS".to_string(), "fintech".to_string()],
            ideal_customer: Some("mid-market B2B".to_string()),
            ..Default::default()
        };
        assert_eq!(deterministic_fallback_query(&bc), deterministic_fallback_query(&bc));
    }

    #[test]
    fn fallback_caps_at_ten_tokens() {
        let bc = BusinessContext {
            industry_focus: (0..20).map(|i| format!("keyword{:02}", i)).collect(),
            ..Default::default()
        };
        let query = deterministic_fallback_query(&bc);
        assert_eq!(query.split_whitespace().count(), 10);
    }

    #[test]
    fn fallback_with_no_usable_fields_returns_static_query() {
        let bc = BusinessContext::default();
        assert_eq!(deterministic_fallback_query(&bc), FINAL_FALLBACK_QUERY);
    }
}
