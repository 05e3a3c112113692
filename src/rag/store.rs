//! Per-job RAG context store: chunking, build/add/query, and the embedding
//! degradation path.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use super::embedding::{keyword_overlap_rank, EmbeddingProvider, FlatL2Index, VectorIndex};

const MAX_CHUNK_CHARACTERS: usize = 1_000;

/// Split `text` on blank lines into paragraphs, then greedily merge
/// paragraphs into chunks up to `MAX_CHUNK_CHARACTERS`, never splitting a
/// paragraph across two chunks.
pub fn chunk_text(text: &str) -> Vec<String> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        if current.is_empty() {
            current.push_str(paragraph);
        } else if current.len() + 2 + paragraph.len() <= MAX_CHUNK_CHARACTERS {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// One job's chunk set plus its vector index, held behind a [`Mutex`] so
/// concurrent `add`/`query` calls from the same job's lead workers observe a
/// consistent view.
struct JobStore {
    index: Mutex<FlatL2Index>,
    raw_chunks: Mutex<Vec<String>>,
}

/// Result of a [`RagStore::query`] call.
#[derive(Debug, Clone)]
pub struct RagQueryResult {
    pub hits: Vec<(String, f32)>,
    /// `true` when no embedding provider was available or it failed and the
    /// store fell back to keyword overlap.
    pub degraded: bool,
}

/// The RAG context store. One instance is shared across all
/// lead workers in a job; per-job state lives in a concurrent map keyed by
/// `job_id`.
pub struct RagStore {
    jobs: DashMap<String, Arc<JobStore>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl RagStore {
    pub fn new(embedding_provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self {
            jobs: DashMap::new(),
            embedding_provider,
        }
    }

    /// Idempotent per job: calling `build` again for a job already present
    /// replaces its seed chunks, matching the original "build once at job
    /// start" usage without requiring callers to track whether they already
    /// called it.
    pub async fn build(&self, job_id: &str, seed_text_chunks: &[String]) {
        let store = Arc::new(JobStore {
            index: Mutex::new(FlatL2Index::new()),
            raw_chunks: Mutex::new(Vec::new()),
        });
        self.jobs.insert(job_id.to_string(), store);
        self.add(job_id, seed_text_chunks).await;
    }

    /// Append more chunks to an already-built job store.
    pub async fn add(&self, job_id: &str, new_text_chunks: &[String]) {
        let Some(store) = self.jobs.get(job_id).map(|e| e.value().clone()) else {
            return;
        };

        let mut chunks = Vec::new();
        for text in new_text_chunks {
            chunks.extend(chunk_text(text));
        }
        if chunks.is_empty() {
            return;
        }

        store.raw_chunks.lock().unwrap().extend(chunks.clone());

        if let Some(provider) = &self.embedding_provider {
            if let Ok(vectors) = provider.embed(&chunks).await {
                store.index.lock().unwrap().add(chunks, vectors);
            }
        }
    }

    /// Query the job's chunk set. Degrades to keyword overlap when no
    /// embedding provider is configured, or when embedding the query fails.
    pub async fn query(&self, job_id: &str, query_text: &str, k: usize) -> RagQueryResult {
        let Some(store) = self.jobs.get(job_id).map(|e| e.value().clone()) else {
            return RagQueryResult {
                hits: Vec::new(),
                degraded: false,
            };
        };

        if let Some(provider) = &self.embedding_provider {
            if let Ok(mut vectors) = provider.embed(&[query_text.to_string()]).await {
                if let Some(query_vector) = vectors.pop() {
                    let index = store.index.lock().unwrap();
                    if !index.is_empty() {
                        return RagQueryResult {
                            hits: index.search(&query_vector, k),
                            degraded: false,
                        };
                    }
                }
            }
        }

        let chunks = store.raw_chunks.lock().unwrap().clone();
        RagQueryResult {
            hits: keyword_overlap_rank(&chunks, query_text, k),
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_never_splits_a_paragraph() {
        let long_paragraph = "x".repeat(1_200);
        let text = format!("short one\n\n{}", long_paragraph);
        let chunks = chunk_text(&text);
        assert!(chunks.iter().any(|c| c == &long_paragraph));
    }

    #[test]
    fn chunk_text_merges_short_paragraphs_up_to_the_cap() {
        let text = "one\n\ntwo\n\nthree";
        let chunks = chunk_text(text);
        assert_eq!(chunks, vec!["one\n\ntwo\n\nthree".to_string()]);
    }

    #[tokio::test]
    async fn query_without_embedding_provider_degrades_to_keyword_overlap() {
        let store = RagStore::new(None);
        store
            .build(
                "job-1",
                &["B2B sales automation platform for mid-market SaaS".to_string()],
            )
            .await;
        let result = store.query("job-1", "SaaS sales platform", 1).await;
        assert!(result.degraded);
        assert_eq!(result.hits.len(), 1);
    }

    #[tokio::test]
    async fn query_for_unknown_job_returns_empty_not_degraded() {
        let store = RagStore::new(None);
        let result = store.query("missing-job", "anything", 3).await;
        assert!(result.hits.is_empty());
        assert!(!result.degraded);
    }
}
