//! Configuration for the prospect pipeline.
//!
//! Provides [`PipelineConfig`], a plain struct users construct by hand — no
//! TOML/YAML/env-parsing dependency is introduced.
//!
//! # Example
//!
//! ```rust
//! use prospect_pipeline::config::PipelineConfig;
//!
//! // Defaults below.
//! let config = PipelineConfig::default();
//! assert_eq!(config.max_retries, 3);
//! assert_eq!(config.lead_worker_concurrency, 8);
//!
//! // Or override selectively.
//! let config = PipelineConfig {
//!     lead_worker_concurrency: 4,
//!     ..PipelineConfig::default()
//! };
//! assert_eq!(config.lead_worker_concurrency, 4);
//! ```

use std::collections::HashMap;

/// Global configuration recognized by the pipeline.
///
/// Users construct this manually, generally once per process, and pass it to
/// [`PipelineOrchestrator::new`](crate::orchestrator::PipelineOrchestrator::new).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum LLM Gateway retry attempts before downgrading to a stage
    /// default. Default `3`.
    pub max_retries: u32,
    /// Base retry delay in seconds for transport errors. Rate-limit backoff
    /// multiplies this by `(attempt + 2)`. Default `5`.
    pub retry_delay_seconds: u64,
    /// Hard cap on concurrently running lead workers. Default `8`.
    pub lead_worker_concurrency: usize,
    /// Global prompt-character ceiling a stage's rendered prompt must fit
    /// after per-field truncation. Default `180_000`.
    pub llm_max_prompt_characters: usize,
    /// Soft cap on cleaned scrape text, in characters. Default `10_000`.
    pub scrape_max_characters: usize,
    /// Capacity of the bounded event channel. Default `64`.
    pub event_channel_capacity: usize,
    /// Default `max_results` passed to `search()` for enrichment
    /// sub-queries (the harvester call instead uses `max_leads_to_generate`).
    /// Default `3`.
    pub search_max_results_per_query: usize,
    /// Number of external-intelligence sub-queries budgeted per lead for the
    /// `tavily_enrichment` stage. Default `3`.
    pub tavily_total_queries_per_lead: usize,
    /// Per-stage, per-field character budgets. Populated from each stage's
    /// [`StageDefinition`](crate::stage::registry::StageDefinition) at
    /// registry-build time; callers may override specific entries.
    pub stage_prompt_variable_budgets: HashMap<&'static str, HashMap<&'static str, usize>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_seconds: 5,
            lead_worker_concurrency: 8,
            llm_max_prompt_characters: 180_000,
            scrape_max_characters: 10_000,
            event_channel_capacity: 64,
            search_max_results_per_query: 3,
            tavily_total_queries_per_lead: 3,
            stage_prompt_variable_budgets: HashMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Look up the character budget declared for `field` on `stage`, falling
    /// back to `default_budget` when no override is registered.
    pub fn field_budget(&self, stage: &str, field: &str, default_budget: usize) -> usize {
        self.stage_prompt_variable_budgets
            .get(stage)
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(default_budget)
    }
}
