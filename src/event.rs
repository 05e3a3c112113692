//! The 12 pipeline event tags and their pure JSON projection.
//!
//! Events are values, never objects with inherited behavior — one enum, one
//! tag dispatch, one serializer. [`Event::to_json`] does no I/O and cannot
//! fail: every variant has a total mapping onto a JSON object carrying
//! `event_type`, `timestamp`, `job_id`, `user_id` plus its own fields.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::domain::ComprehensiveProspectPackage;

/// Common envelope fields every event carries.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub job_id: String,
    pub user_id: String,
}

impl EventEnvelope {
    pub fn new(job_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            job_id: job_id.into(),
            user_id: user_id.into(),
        }
    }

    fn to_json_base(&self, event_type: &str) -> Value {
        json!({
            "event_type": event_type,
            "timestamp": self.timestamp.to_rfc3339(),
            "job_id": self.job_id,
            "user_id": self.user_id,
        })
    }
}

/// The 12 pipeline event tags.
#[derive(Debug, Clone)]
pub enum Event {
    PipelineStart {
        envelope: EventEnvelope,
        initial_query: String,
        max_leads_to_generate: u32,
    },
    PipelineEnd {
        envelope: EventEnvelope,
        total_leads_generated: u32,
        execution_time_seconds: f64,
        success: bool,
        error_message: Option<String>,
    },
    PipelineError {
        envelope: EventEnvelope,
        error_message: String,
        error_type: String,
        agent_name: Option<String>,
        tool_name: Option<String>,
    },
    LeadGenerated {
        envelope: EventEnvelope,
        lead_id: String,
        company_name: String,
        source_url: String,
        agent_name: String,
    },
    LeadEnrichmentStart {
        envelope: EventEnvelope,
        lead_id: String,
        company_name: String,
    },
    LeadEnrichmentEnd {
        envelope: EventEnvelope,
        lead_id: String,
        success: bool,
        execution_time_seconds: f64,
        package: Option<Box<ComprehensiveProspectPackage>>,
        error_message: Option<String>,
    },
    AgentStart {
        envelope: EventEnvelope,
        agent_name: String,
        agent_description: String,
        input_query: String,
    },
    AgentEnd {
        envelope: EventEnvelope,
        agent_name: String,
        execution_time_seconds: f64,
        success: bool,
        final_response: Option<String>,
        error_message: Option<String>,
    },
    ToolCallStart {
        envelope: EventEnvelope,
        tool_name: String,
        agent_name: String,
        tool_args: Value,
    },
    ToolCallOutput {
        envelope: EventEnvelope,
        tool_name: String,
        agent_name: String,
        output_snippet: String,
        is_final: bool,
    },
    ToolCallEnd {
        envelope: EventEnvelope,
        tool_name: String,
        agent_name: String,
        execution_time_seconds: f64,
        success: bool,
        error_message: Option<String>,
    },
    StatusUpdate {
        envelope: EventEnvelope,
        status_message: String,
        agent_name: Option<String>,
        progress_percentage: Option<f64>,
    },
}

impl Event {
    pub fn envelope(&self) -> &EventEnvelope {
        match self {
            Event::PipelineStart { envelope, .. }
            | Event::PipelineEnd { envelope, .. }
            | Event::PipelineError { envelope, .. }
            | Event::LeadGenerated { envelope, .. }
            | Event::LeadEnrichmentStart { envelope, .. }
            | Event::LeadEnrichmentEnd { envelope, .. }
            | Event::AgentStart { envelope, .. }
            | Event::AgentEnd { envelope, .. }
            | Event::ToolCallStart { envelope, .. }
            | Event::ToolCallOutput { envelope, .. }
            | Event::ToolCallEnd { envelope, .. }
            | Event::StatusUpdate { envelope, .. } => envelope,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Event::PipelineStart { .. } => "pipeline_start",
            Event::PipelineEnd { .. } => "pipeline_end",
            Event::PipelineError { .. } => "pipeline_error",
            Event::LeadGenerated { .. } => "lead_generated",
            Event::LeadEnrichmentStart { .. } => "lead_enrichment_start",
            Event::LeadEnrichmentEnd { .. } => "lead_enrichment_end",
            Event::AgentStart { .. } => "agent_start",
            Event::AgentEnd { .. } => "agent_end",
            Event::ToolCallStart { .. } => "tool_call_start",
            Event::ToolCallOutput { .. } => "tool_call_output",
            Event::ToolCallEnd { .. } => "tool_call_end",
            Event::StatusUpdate { .. } => "status_update",
        }
    }

    /// Pure total projection to a JSON object. Never fails: every field is
    /// already representable as JSON, and non-string URL-like fields render
    /// as their canonical string form.
    pub fn to_json(&self) -> Value {
        let mut base = self.envelope().to_json_base(self.tag());
        let obj = base.as_object_mut().expect("base is always an object");

        match self {
            Event::PipelineStart {
                initial_query,
                max_leads_to_generate,
                ..
            } => {
                obj.insert("initial_query".into(), json!(initial_query));
                obj.insert("max_leads_to_generate".into(), json!(max_leads_to_generate));
            }
            Event::PipelineEnd {
                total_leads_generated,
                execution_time_seconds,
                success,
                error_message,
                ..
            } => {
                obj.insert("total_leads_generated".into(), json!(total_leads_generated));
                obj.insert("execution_time_seconds".into(), json!(execution_time_seconds));
                obj.insert("success".into(), json!(success));
                obj.insert("error_message".into(), json!(error_message));
            }
            Event::PipelineError {
                error_message,
                error_type,
                agent_name,
                tool_name,
                ..
            } => {
                obj.insert("error_message".into(), json!(error_message));
                obj.insert("error_type".into(), json!(error_type));
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("tool_name".into(), json!(tool_name));
            }
            Event::LeadGenerated {
                lead_id,
                company_name,
                source_url,
                agent_name,
                ..
            } => {
                obj.insert("lead_id".into(), json!(lead_id));
                obj.insert("company_name".into(), json!(company_name));
                obj.insert("source_url".into(), json!(source_url));
                obj.insert("agent_name".into(), json!(agent_name));
            }
            Event::LeadEnrichmentStart {
                lead_id,
                company_name,
                ..
            } => {
                obj.insert("lead_id".into(), json!(lead_id));
                obj.insert("company_name".into(), json!(company_name));
            }
            Event::LeadEnrichmentEnd {
                lead_id,
                success,
                execution_time_seconds,
                package,
                error_message,
                ..
            } => {
                obj.insert("lead_id".into(), json!(lead_id));
                obj.insert("success".into(), json!(success));
                obj.insert("execution_time_seconds".into(), json!(execution_time_seconds));
                obj.insert(
                    "package".into(),
                    package
                        .as_ref()
                        .map(|p| serde_json::to_value(p.as_ref()).unwrap_or(Value::Null))
                        .unwrap_or(Value::Null),
                );
                obj.insert("error_message".into(), json!(error_message));
            }
            Event::AgentStart {
                agent_name,
                agent_description,
                input_query,
                ..
            } => {
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("agent_description".into(), json!(agent_description));
                obj.insert("input_query".into(), json!(input_query));
            }
            Event::AgentEnd {
                agent_name,
                execution_time_seconds,
                success,
                final_response,
                error_message,
                ..
            } => {
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("execution_time_seconds".into(), json!(execution_time_seconds));
                obj.insert("success".into(), json!(success));
                obj.insert("final_response".into(), json!(final_response));
                obj.insert("error_message".into(), json!(error_message));
            }
            Event::ToolCallStart {
                tool_name,
                agent_name,
                tool_args,
                ..
            } => {
                obj.insert("tool_name".into(), json!(tool_name));
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("tool_args".into(), tool_args.clone());
            }
            Event::ToolCallOutput {
                tool_name,
                agent_name,
                output_snippet,
                is_final,
                ..
            } => {
                obj.insert("tool_name".into(), json!(tool_name));
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("output_snippet".into(), json!(output_snippet));
                obj.insert("is_final".into(), json!(is_final));
            }
            Event::ToolCallEnd {
                tool_name,
                agent_name,
                execution_time_seconds,
                success,
                error_message,
                ..
            } => {
                obj.insert("tool_name".into(), json!(tool_name));
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("execution_time_seconds".into(), json!(execution_time_seconds));
                obj.insert("success".into(), json!(success));
                obj.insert("error_message".into(), json!(error_message));
            }
            Event::StatusUpdate {
                status_message,
                agent_name,
                progress_percentage,
                ..
            } => {
                obj.insert("status_message".into(), json!(status_message));
                obj.insert("agent_name".into(), json!(agent_name));
                obj.insert("progress_percentage".into(), json!(progress_percentage));
            }
        }

        base
    }
}
