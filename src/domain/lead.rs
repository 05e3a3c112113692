//! [`Lead`], the per-lead working set [`LeadState`], and the terminal
//! [`ComprehensiveProspectPackage`] artifact.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::business_context::BusinessContext;
use crate::llm::client::TokenUsage;

/// One invocation of the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: String,
    pub user_id: String,
    pub business_context: BusinessContext,
    pub max_leads: u32,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, user_id: impl Into<String>, business_context: BusinessContext, max_leads: u32) -> Self {
        Self {
            job_id: job_id.into(),
            user_id: user_id.into(),
            business_context,
            max_leads,
            created_at: Utc::now(),
        }
    }
}

/// A candidate company harvested from search. Never mutates
/// after creation — all evolving state lives in [`LeadState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: String,
    pub company_name: String,
    pub website_url: String,
    pub initial_description: String,
}

impl Lead {
    /// Deterministic placeholder lead used when search fails or returns
    /// zero results. The description
    /// carries the literal substring "fallback" so tests and operators can
    /// recognize a degraded harvest.
    pub fn fallback(job_id: &str) -> Self {
        Self {
            lead_id: format!("fallback-{}", job_id),
            company_name: "Unknown Prospect (fallback)".to_string(),
            website_url: "https://example.invalid/fallback-lead".to_string(),
            initial_description:
                "Synthesized fallback lead: search returned no results for this job.".to_string(),
        }
    }
}

/// Progress marker for the DAG node currently (or most recently) active on a
/// [`LeadState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Succeeded,
    FailedWithDefault,
}

/// One stage's stored output plus its `error_message`, keyed by stage name
/// inside [`LeadState`]. The payload is stored as JSON rather than a typed
/// value because the DAG executor routes heterogeneous stage output types
/// through one homogeneous map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub payload: serde_json::Value,
    pub error_message: Option<String>,
}

/// Per-stage execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetrics {
    pub stage_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub tokens: Option<TokenUsage>,
    pub llm_call_count: u32,
}

/// The evolving per-lead working set. Owned by exactly one
/// lead worker; never read by another worker.
#[derive(Debug, Clone)]
pub struct LeadState {
    pub lead: Lead,
    outputs: HashMap<String, StageRecord>,
    pub metrics: Vec<StageMetrics>,
    pub current_stage: Option<String>,
    pub status: NodeStatus,
}

impl LeadState {
    pub fn new(lead: Lead) -> Self {
        Self {
            lead,
            outputs: HashMap::new(),
            metrics: Vec::new(),
            current_stage: None,
            status: NodeStatus::Pending,
        }
    }

    /// Store a stage's output under its stable name. Overwrites any prior
    /// record for the same stage (stages never re-run within one DAG walk).
    pub fn record_output(&mut self, stage_name: &str, record: StageRecord) {
        self.outputs.insert(stage_name.to_string(), record);
    }

    /// Look up a stage's stored output by name, for downstream stages to
    /// consume as part of their input assembly.
    pub fn output(&self, stage_name: &str) -> Option<&StageRecord> {
        self.outputs.get(stage_name)
    }

    /// Typed accessor: deserialize a previously stored stage output back
    /// into its concrete output type.
    pub fn typed_output<T: serde::de::DeserializeOwned>(&self, stage_name: &str) -> Option<T> {
        self.outputs
            .get(stage_name)
            .and_then(|r| serde_json::from_value(r.payload.clone()).ok())
    }

    pub fn all_outputs(&self) -> &HashMap<String, StageRecord> {
        &self.outputs
    }

    pub fn failed_stages(&self) -> Vec<String> {
        self.outputs
            .iter()
            .filter(|(_, r)| r.error_message.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.outputs.is_empty() {
            return 0.0;
        }
        let succeeded = self.outputs.values().filter(|r| r.error_message.is_none()).count();
        succeeded as f64 / self.outputs.len() as f64
    }
}

/// The terminal per-lead artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveProspectPackage {
    pub lead: Lead,
    pub stage_outputs: HashMap<String, StageRecord>,
    pub confidence_score: f64,
    pub roi_potential_score: f64,
    pub engagement_readiness_score: f64,
    pub metrics: Vec<StageMetrics>,
    pub success_rate: f64,
    pub failed_stages: Vec<String>,
    pub processing_summary: String,
}

impl ComprehensiveProspectPackage {
    pub fn from_lead_state(
        state: &LeadState,
        confidence_score: f64,
        roi_potential_score: f64,
        engagement_readiness_score: f64,
    ) -> Self {
        let failed_stages = state.failed_stages();
        let processing_summary = if failed_stages.is_empty() {
            format!(
                "{} stages completed cleanly for {}.",
                state.metrics.len(),
                state.lead.company_name
            )
        } else {
            format!(
                "{} of {} stages completed cleanly for {}; {} fell back to defaults: {}.",
                state.metrics.len() - failed_stages.len(),
                state.metrics.len(),
                state.lead.company_name,
                failed_stages.len(),
                failed_stages.join(", ")
            )
        };

        Self {
            lead: state.lead.clone(),
            stage_outputs: state.all_outputs().clone(),
            confidence_score,
            roi_potential_score,
            engagement_readiness_score,
            metrics: state.metrics.clone(),
            success_rate: state.success_rate(),
            failed_stages,
            processing_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_lead_carries_marker_substring() {
        let lead = Lead::fallback("job-42");
        assert!(lead.initial_description.to_lowercase().contains("fallback"));
    }

    #[test]
    fn lead_state_tracks_failed_stages_and_success_rate() {
        let mut state = LeadState::new(Lead::fallback("job-1"));
        state.record_output(
            "intake",
            StageRecord {
                payload: serde_json::json!({"ok": true}),
                error_message: None,
            },
        );
        state.record_output(
            "analysis",
            StageRecord {
                payload: serde_json::json!({"ok": false}),
                error_message: Some("llm transport error".into()),
            },
        );
        assert_eq!(state.failed_stages(), vec!["analysis".to_string()]);
        assert!((state.success_rate() - 0.5).abs() < 1e-9);
    }
}
