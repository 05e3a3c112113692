//! Persistence sidecar: store and reload an
//! [`EnrichedContext`] by job id. Writes are single-producer (the
//! orchestrator at job start), so no locking beyond the backing map's own is
//! required.

use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::EnrichedContext;
use crate::error::PersistenceError;

/// The downstream key-value interface the sidecar is built on.
pub trait KeyValueStore: Send + Sync {
    fn put(&self, key: &str, blob: Vec<u8>);
    fn get(&self, key: &str) -> Result<Vec<u8>, PersistenceError>;
}

/// Default in-process store. Production deployments swap this for a real
/// backing store without changing [`PersistenceSidecar`]'s contract.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, Vec<u8>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn put(&self, key: &str, blob: Vec<u8>) {
        self.entries.insert(key.to_string(), blob);
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, PersistenceError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or(PersistenceError::NotFound)
    }
}

fn enriched_context_key(job_id: &str) -> String {
    format!("enriched_context/{}", job_id)
}

/// Serializes [`EnrichedContext`] as JSON under `enriched_context/<job_id>`.
pub struct PersistenceSidecar {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceSidecar {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyValueStore::default()))
    }

    pub fn save(&self, enriched: &EnrichedContext) -> Result<(), PersistenceError> {
        let blob = serde_json::to_vec(enriched).map_err(|e| PersistenceError::Io(e.to_string()))?;
        self.store.put(&enriched_context_key(&enriched.job_id), blob);
        Ok(())
    }

    pub fn load(&self, job_id: &str) -> Result<EnrichedContext, PersistenceError> {
        let blob = self.store.get(&enriched_context_key(job_id))?;
        serde_json::from_slice(&blob).map_err(|e| PersistenceError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BusinessContext;

    #[test]
    fn save_then_load_round_trips_structurally() {
        let sidecar = PersistenceSidecar::in_memory();
        let bc = BusinessContext {
            product_service_description: Some("Widgets".to_string()),
            ..Default::default()
        };
        let enriched = EnrichedContext::new("job-7", bc, "widgets for mid-market".to_string());
        sidecar.save(&enriched).unwrap();

        let reloaded = sidecar.load("job-7").unwrap();
        assert_eq!(reloaded.job_id, enriched.job_id);
        assert_eq!(reloaded.search_query, enriched.search_query);
        assert_eq!(
            reloaded.business_context.product_service_description,
            enriched.business_context.product_service_description
        );
    }

    #[test]
    fn load_for_unknown_job_returns_not_found() {
        let sidecar = PersistenceSidecar::in_memory();
        assert!(matches!(sidecar.load("missing"), Err(PersistenceError::NotFound)));
    }
}
