//! Pipeline orchestrator: the top-level driver that turns a
//! [`BusinessContext`] into a bounded stream of [`Event`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::dag::DagExecutor;
use crate::domain::{BusinessContext, EnrichedContext, Lead};
use crate::event::{Event, EventEnvelope};
use crate::llm::gateway::LlmGateway;
use crate::persistence::PersistenceSidecar;
use crate::query_synth::synthesize_query;
use crate::rag::RagStore;
use crate::search::{ScrapeClient, SearchClient};
use crate::stage::{StageContext, StageRegistry};

/// A running pipeline: the event stream plus a handle to cancel it.
pub struct PipelineRun {
    pub events: ReceiverStream<Event>,
    cancel_flag: Arc<AtomicBool>,
}

impl PipelineRun {
    /// Request cancellation. Workers observe this between stages and
    /// dispatches; there is no mid-stage interruption.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }
}

/// The top-level driver. Holds every collaborator handle a
/// job needs; stateless across jobs beyond those shared handles.
pub struct PipelineOrchestrator {
    gateway: Arc<LlmGateway>,
    search: Option<Arc<dyn SearchClient>>,
    scrape: Option<Arc<dyn ScrapeClient>>,
    rag: Arc<RagStore>,
    registry: Arc<StageRegistry>,
    persistence: Arc<PersistenceSidecar>,
    config: Arc<PipelineConfig>,
}

impl PipelineOrchestrator {
    pub fn new(
        gateway: Arc<LlmGateway>,
        search: Option<Arc<dyn SearchClient>>,
        scrape: Option<Arc<dyn ScrapeClient>>,
        rag: Arc<RagStore>,
        persistence: Arc<PersistenceSidecar>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            gateway,
            search,
            scrape,
            rag,
            registry: Arc::new(StageRegistry::build()),
            persistence,
            config,
        }
    }

    /// Entry point: `run(business_context, user_id, job_id)
    /// → lazy sequence of Events`. Finite, non-restartable: each call spawns
    /// exactly one job.
    pub fn run(
        self: Arc<Self>,
        business_context: BusinessContext,
        user_id: String,
        job_id: String,
        max_leads_to_generate: u32,
    ) -> PipelineRun {
        let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let cancel_for_job = cancel_flag.clone();

        tokio::spawn(async move {
            self.drive(tx, business_context, user_id, job_id, max_leads_to_generate, cancel_for_job)
                .await;
        });

        PipelineRun {
            events: ReceiverStream::new(rx),
            cancel_flag,
        }
    }

    async fn drive(
        self: Arc<Self>,
        tx: mpsc::Sender<Event>,
        business_context: BusinessContext,
        user_id: String,
        job_id: String,
        max_leads_to_generate: u32,
        cancel_flag: Arc<AtomicBool>,
    ) {
        let clock = Instant::now();
        let envelope = EventEnvelope::new(job_id.clone(), user_id.clone());

        let query = synthesize_query(&self.gateway, &business_context).await;

        if log::log_enabled!(log::Level::Info) {
            log::info!("job {} starting with query `{}`", job_id, query);
        }

        if tx
            .send(Event::PipelineStart {
                envelope: envelope.clone(),
                initial_query: query.clone(),
                max_leads_to_generate,
            })
            .await
            .is_err()
        {
            return;
        }

        let enriched = EnrichedContext::new(job_id.clone(), business_context, query.clone());

        if let Err(e) = self.persistence.save(&enriched) {
            let _ = tx
                .send(Event::PipelineError {
                    envelope: envelope.clone(),
                    error_message: format!("persistence unavailable: {}", e),
                    error_type: "persistence_unavailable".to_string(),
                    agent_name: None,
                    tool_name: None,
                })
                .await;
            let _ = tx
                .send(Event::PipelineEnd {
                    envelope,
                    total_leads_generated: 0,
                    execution_time_seconds: clock.elapsed().as_secs_f64(),
                    success: false,
                    error_message: Some(format!("persistence unavailable: {}", e)),
                })
                .await;
            return;
        }

        let (rag_ready_tx, rag_ready_rx) = watch::channel(false);
        {
            let rag = self.rag.clone();
            let job_id_for_rag = job_id.clone();
            let seed_chunks = enriched.seed_chunks();
            tokio::spawn(async move {
                rag.build(&job_id_for_rag, &seed_chunks).await;
                let _ = rag_ready_tx.send(true);
            });
        }

        if max_leads_to_generate == 0 {
            let _ = tx
                .send(Event::PipelineEnd {
                    envelope,
                    total_leads_generated: 0,
                    execution_time_seconds: clock.elapsed().as_secs_f64(),
                    success: true,
                    error_message: None,
                })
                .await;
            return;
        }

        let leads = match &self.search {
            Some(search) => match search.search(&query, max_leads_to_generate as usize).await {
                Ok(results) if !results.is_empty() => results
                    .into_iter()
                    .map(|r| Lead {
                        lead_id: Uuid::new_v4().to_string(),
                        company_name: if r.title.trim().is_empty() { r.url.clone() } else { r.title },
                        website_url: r.url,
                        initial_description: r.snippet,
                    })
                    .collect::<Vec<_>>(),
                Ok(_) => {
                    if log::log_enabled!(log::Level::Warn) {
                        log::warn!("job {} search returned zero results, synthesizing fallback lead", job_id);
                    }
                    vec![Lead::fallback(&job_id)]
                }
                Err(e) => {
                    if log::log_enabled!(log::Level::Warn) {
                        log::warn!("job {} search failed ({}), synthesizing fallback lead", job_id, e);
                    }
                    vec![Lead::fallback(&job_id)]
                }
            },
            None => vec![Lead::fallback(&job_id)],
        };

        let total_leads_generated = leads.len() as u32;
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.lead_worker_concurrency));
        let mut workers = JoinSet::new();
        let any_cancelled = Arc::new(AtomicBool::new(false));
        let enriched = Arc::new(enriched);

        for lead in leads {
            if tx
                .send(Event::LeadGenerated {
                    envelope: EventEnvelope::new(job_id.clone(), user_id.clone()),
                    lead_id: lead.lead_id.clone(),
                    company_name: lead.company_name.clone(),
                    source_url: lead.website_url.clone(),
                    agent_name: "harvester".to_string(),
                })
                .await
                .is_err()
            {
                break;
            }

            let semaphore = semaphore.clone();
            let tx = tx.clone();
            let rag_ready_rx = rag_ready_rx.clone();
            let cancel_flag = cancel_flag.clone();
            let any_cancelled = any_cancelled.clone();
            let stage_ctx = StageContext {
                gateway: self.gateway.clone(),
                search: self.search.clone(),
                scrape: self.scrape.clone(),
                rag: self.rag.clone(),
                config: self.config.clone(),
                job_id: job_id.clone(),
                user_id: user_id.clone(),
            };
            let executor = DagExecutor::new(self.registry.clone());
            let enriched = enriched.clone();

            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let mut rag_ready_rx = rag_ready_rx;
                let _ = rag_ready_rx.wait_for(|ready| *ready).await;

                if cancel_flag.load(Ordering::SeqCst) {
                    any_cancelled.store(true, Ordering::SeqCst);
                }

                let is_cancelled = {
                    let cancel_flag = cancel_flag.clone();
                    let any_cancelled = any_cancelled.clone();
                    move || {
                        let cancelled = cancel_flag.load(Ordering::SeqCst);
                        if cancelled {
                            any_cancelled.store(true, Ordering::SeqCst);
                        }
                        cancelled
                    }
                };

                let events = executor.run(&stage_ctx, &enriched, lead, &is_cancelled).await;
                let succeeded = matches!(events.last(), Some(Event::LeadEnrichmentEnd { success: true, .. }));
                for event in events {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                succeeded
            });
        }

        let mut total_succeeded = 0u32;
        while let Some(result) = workers.join_next().await {
            if matches!(result, Ok(true)) {
                total_succeeded += 1;
            }
        }

        let cancelled = cancel_flag.load(Ordering::SeqCst) || any_cancelled.load(Ordering::SeqCst);
        let success = !cancelled;

        if log::log_enabled!(log::Level::Info) {
            log::info!(
                "job {} finished: {} of {} leads enriched, success={}",
                job_id, total_succeeded, total_leads_generated, success
            );
        }

        let _ = tx
            .send(Event::PipelineEnd {
                envelope,
                total_leads_generated,
                execution_time_seconds: clock.elapsed().as_secs_f64(),
                success,
                error_message: if cancelled { Some("cancelled".to_string()) } else { None },
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{LlmClient, LlmCompletion, TokenUsage};
    use async_trait::async_trait;
    use futures_util::StreamExt;

    struct JsonClient;

    #[async_trait]
    impl LlmClient for JsonClient {
        async fn complete(&self, _prompt: &str) -> Result<LlmCompletion, crate::error::LlmError> {
            Ok(LlmCompletion {
                content: "{}".to_string(),
                usage: TokenUsage::estimate_from_words(5, 5),
            })
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    fn test_orchestrator() -> Arc<PipelineOrchestrator> {
        Arc::new(PipelineOrchestrator::new(
            Arc::new(LlmGateway::new(Arc::new(JsonClient), 1, 0)),
            None,
            None,
            Arc::new(RagStore::new(None)),
            Arc::new(PersistenceSidecar::in_memory()),
            Arc::new(PipelineConfig::default()),
        ))
    }

    #[tokio::test]
    async fn zero_max_leads_emits_only_start_and_end() {
        let orchestrator = test_orchestrator();
        let run = orchestrator.run(BusinessContext::default(), "user-1".to_string(), "job-zero".to_string(), 0);
        let events: Vec<Event> = run.events.collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::PipelineStart { .. }));
        assert!(matches!(
            events[1],
            Event::PipelineEnd { total_leads_generated: 0, success: true, .. }
        ));
    }

    #[tokio::test]
    async fn no_search_client_synthesizes_a_fallback_lead() {
        let orchestrator = test_orchestrator();
        let run = orchestrator.run(BusinessContext::default(), "user-1".to_string(), "job-fallback".to_string(), 3);
        let events: Vec<Event> = run.events.collect().await;

        assert!(matches!(events.first(), Some(Event::PipelineStart { .. })));
        assert!(matches!(events.last(), Some(Event::PipelineEnd { .. })));
        let generated: Vec<&Event> = events.iter().filter(|e| matches!(e, Event::LeadGenerated { .. })).collect();
        assert_eq!(generated.len(), 1);
        if let Event::LeadGenerated { company_name, .. } = generated[0] {
            assert!(company_name.to_lowercase().contains("fallback") || company_name.contains("Unknown"));
        }
    }
}
