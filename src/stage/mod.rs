//! Stage agents: the 17-node catalog that makes up the lead enrichment DAG,
//! plus the generic harness ([`agent::LlmJsonStage`]) most of them are built
//! from and the registry ([`registry::StageRegistry`]) the DAG executor
//! walks.

pub mod agent;
pub mod catalog;
pub mod registry;

pub use agent::{LlmJsonStage, StageAgent, StageCategory, StageContext, StageRunOutcome};
pub use registry::{StageDefinition, StageRegistry};
