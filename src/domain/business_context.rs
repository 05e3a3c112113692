//! [`BusinessContext`] and its derived, immutable [`EnrichedContext`] snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The caller-supplied description of the business running this job.
///
/// A mapping from string keys to values, with recognized keys — deserializes
/// leniently from a JSON object where every key is optional, matching how
/// callers in the original system passed a loose dict through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessContext {
    #[serde(default)]
    pub business_description: Option<String>,
    #[serde(default)]
    pub product_service_description: Option<String>,
    #[serde(default)]
    pub value_proposition: Option<String>,
    #[serde(default)]
    pub ideal_customer: Option<String>,
    #[serde(default)]
    pub industry_focus: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub competitors_list: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Caller-supplied override for the synthesized search query.
    #[serde(default)]
    pub user_search_query: Option<String>,
}

/// Immutable, job-scoped snapshot of the business context plus the
/// synthesized search query.
///
/// Built once per job by [`PipelineOrchestrator`](crate::orchestrator::PipelineOrchestrator),
/// shared by reference across every lead worker, and used as the seed
/// document set for the [`RagStore`](crate::rag::store::RagStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedContext {
    pub job_id: String,
    pub business_context: BusinessContext,
    pub search_query: String,
    pub created_at: DateTime<Utc>,
}

impl EnrichedContext {
    pub fn new(job_id: impl Into<String>, business_context: BusinessContext, search_query: String) -> Self {
        Self {
            job_id: job_id.into(),
            business_context,
            search_query,
            created_at: Utc::now(),
        }
    }

    /// Seed text chunks handed to the RAG store at job start:
    /// one chunk per populated business-context field plus the search query.
    pub fn seed_chunks(&self) -> Vec<String> {
        let bc = &self.business_context;
        let mut chunks = Vec::new();
        if let Some(v) = &bc.business_description {
            chunks.push(format!("Business description: {}", v));
        }
        if let Some(v) = &bc.product_service_description {
            chunks.push(format!("Product/service: {}", v));
        }
        if let Some(v) = &bc.value_proposition {
            chunks.push(format!("Value proposition: {}", v));
        }
        if let Some(v) = &bc.ideal_customer {
            chunks.push(format!("Ideal customer: {}", v));
        }
        if !bc.industry_focus.is_empty() {
            chunks.push(format!("Industry focus: {}", bc.industry_focus.join(", ")));
        }
        if !bc.pain_points.is_empty() {
            chunks.push(format!("Pain points: {}", bc.pain_points.join(", ")));
        }
        if !bc.competitors_list.is_empty() {
            chunks.push(format!("Known competitors: {}", bc.competitors_list.join(", ")));
        }
        chunks.push(format!("Search query: {}", self.search_query));
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_context_deserializes_with_missing_keys() {
        let json = serde_json::json!({
            "product_service_description": "AI sales automation",
            "industry_focus": ["SaaS"]
        });
        let bc: BusinessContext = serde_json::from_value(json).unwrap();
        assert_eq!(bc.product_service_description.as_deref(), Some("AI sales automation"));
        assert_eq!(bc.industry_focus, vec!["SaaS".to_string()]);
        assert!(bc.business_description.is_none());
        assert!(bc.pain_points.is_empty());
    }

    #[test]
    fn enriched_context_round_trips_through_json() {
        let bc = BusinessContext {
            product_service_description: Some("Widgets".into()),
            ..Default::default()
        };
        let ctx = EnrichedContext::new("job-1", bc, "widgets for mid-market".into());
        let json = serde_json::to_value(&ctx).unwrap();
        let back: EnrichedContext = serde_json::from_value(json).unwrap();
        assert_eq!(back.job_id, ctx.job_id);
        assert_eq!(back.search_query, ctx.search_query);
    }
}
