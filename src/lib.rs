//! A streaming pipeline orchestrator and per-lead enrichment DAG that turns
//! a business description into deeply enriched, sales-ready B2B prospect
//! packages.
//!
//! The entry point is [`orchestrator::PipelineOrchestrator::run`], which
//! returns a bounded stream of [`event::Event`]s for one job.

pub mod config;
pub mod dag;
pub mod domain;
pub mod error;
pub mod event;
pub mod llm;
pub mod orchestrator;
pub mod persistence;
pub mod persona;
pub mod query_synth;
pub mod rag;
pub mod scoring;
pub mod search;
pub mod stage;

pub use config::PipelineConfig;
pub use domain::{BusinessContext, ComprehensiveProspectPackage, EnrichedContext, Lead};
pub use event::Event;
pub use orchestrator::{PipelineOrchestrator, PipelineRun};
