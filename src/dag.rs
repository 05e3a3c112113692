//! Lead enrichment DAG executor: walks the stage registry in
//! execution order for one lead, accumulating its [`LeadState`] and emitting
//! the bracketing `lead_enrichment_start`/`lead_enrichment_end` pair.

use std::sync::Arc;
use std::time::Instant;

use crate::domain::{ComprehensiveProspectPackage, EnrichedContext, Lead, LeadState, NodeStatus};
use crate::event::{Event, EventEnvelope};
use crate::scoring::{confidence_score, engagement_readiness_score, roi_potential_score};
use crate::stage::{StageContext, StageRegistry};

/// Runs every registered stage, in order, for one lead. A stage never aborts
/// the walk — the only early exit is
/// cancellation, which still emits a closing, failed `lead_enrichment_end`.
pub struct DagExecutor {
    registry: Arc<StageRegistry>,
}

impl DagExecutor {
    pub fn new(registry: Arc<StageRegistry>) -> Self {
        Self { registry }
    }

    /// Run the full DAG for `lead`, returning every event emitted along the
    /// way (the bracketing pair plus one `agent_start`/`agent_end` pair per
    /// stage). `is_cancelled` is polled between stages.
    pub async fn run(
        &self,
        ctx: &StageContext,
        enriched: &EnrichedContext,
        lead: Lead,
        is_cancelled: &(dyn Fn() -> bool + Send + Sync),
    ) -> Vec<Event> {
        let mut events = Vec::new();
        let envelope = EventEnvelope::new(ctx.job_id.clone(), ctx.user_id.clone());
        let clock = Instant::now();

        events.push(Event::LeadEnrichmentStart {
            envelope: envelope.clone(),
            lead_id: lead.lead_id.clone(),
            company_name: lead.company_name.clone(),
        });

        let mut state = LeadState::new(lead);
        state.status = NodeStatus::Running;
        let mut rag_degradation_reported = false;

        for stage in self.registry.stages() {
            if is_cancelled() {
                events.push(Event::LeadEnrichmentEnd {
                    envelope: envelope.clone(),
                    lead_id: state.lead.lead_id.clone(),
                    success: false,
                    execution_time_seconds: clock.elapsed().as_secs_f64(),
                    package: None,
                    error_message: Some("cancelled".to_string()),
                });
                return events;
            }

            state.current_stage = Some(stage.name().to_string());
            let outcome = stage.run(ctx, enriched, &state).await;

            state.record_output(stage.name(), outcome.record);
            state.metrics.push(outcome.metrics);
            events.extend(outcome.events);

            if !outcome.rag_chunks.is_empty() {
                ctx.rag.add(&ctx.job_id, &outcome.rag_chunks).await;
            }

            if outcome.rag_degraded && !rag_degradation_reported {
                rag_degradation_reported = true;
                events.push(Event::StatusUpdate {
                    envelope: envelope.clone(),
                    status_message: "RAG store degraded to keyword-overlap fallback".to_string(),
                    agent_name: Some(stage.name().to_string()),
                    progress_percentage: None,
                });
            }
        }

        state.status = NodeStatus::Succeeded;

        let confidence = confidence_score(&state);
        let roi_potential = roi_potential_score(&state);
        let engagement_readiness = engagement_readiness_score(&state);
        let package = ComprehensiveProspectPackage::from_lead_state(
            &state,
            confidence,
            roi_potential,
            engagement_readiness,
        );

        events.push(Event::LeadEnrichmentEnd {
            envelope,
            lead_id: state.lead.lead_id.clone(),
            success: true,
            execution_time_seconds: clock.elapsed().as_secs_f64(),
            package: Some(Box::new(package)),
            error_message: None,
        });

        events
    }
}
