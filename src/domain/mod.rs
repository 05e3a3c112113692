//! Domain model: the data that flows through one job.

mod business_context;
mod lead;
mod urgency;

pub use business_context::{BusinessContext, EnrichedContext};
pub use lead::{
    ComprehensiveProspectPackage, Job, Lead, LeadState, NodeStatus, StageRecord, StageMetrics,
};
pub use urgency::UrgencyLevel;
