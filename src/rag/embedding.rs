//! Embedding provider and vector index traits, plus the default brute-force
//! implementations.

use async_trait::async_trait;

use crate::error::RagError;

/// Turns text into a fixed-dimension float vector. Analogous to the
/// `sentence_transformers` model the original pipeline loaded once at
/// startup; a `None` provider is a legitimate configuration and the RAG
/// store degrades gracefully instead of treating it as an error.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
    fn dimension(&self) -> usize;
}

/// A queryable collection of embedded chunks for one job.
pub trait VectorIndex: Send + Sync {
    fn add(&mut self, chunks: Vec<String>, vectors: Vec<Vec<f32>>);
    /// Return up to `k` (chunk, similarity) pairs ordered by decreasing
    /// similarity. Similarity here is `1 / (1 + l2_distance)` so higher is
    /// always better, matching the ordering contract the rest of the system
    /// expects from `query`.
    fn search(&self, query_vector: &[f32], k: usize) -> Vec<(String, f32)>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force flat L2 index — the direct analogue of `faiss.IndexFlatL2`
/// for a corpus this small (a handful of seed chunks plus per-lead
/// enrichment text, never the millions of vectors FAISS's approximate
/// indexes exist for).
#[derive(Debug, Default)]
pub struct FlatL2Index {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for FlatL2Index {
    fn add(&mut self, chunks: Vec<String>, vectors: Vec<Vec<f32>>) {
        self.chunks.extend(chunks);
        self.vectors.extend(vectors);
    }

    fn search(&self, query_vector: &[f32], k: usize) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = self
            .chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(chunk, vector)| {
                let distance = l2_distance(query_vector, vector);
                (chunk.clone(), 1.0 / (1.0 + distance))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Degraded fallback used when no [`EmbeddingProvider`] is configured or it
/// fails: ranks chunks by keyword overlap with the query instead of a vector
/// distance. Never returned silently — callers surface the
/// degradation via `RagQueryResult::degraded`.
pub fn keyword_overlap_rank(chunks: &[String], query_text: &str, k: usize) -> Vec<(String, f32)> {
    let query_words: Vec<String> = tokenize(query_text);
    if query_words.is_empty() {
        return chunks.iter().take(k).map(|c| (c.clone(), 0.0)).collect();
    }

    let mut scored: Vec<(String, f32)> = chunks
        .iter()
        .map(|chunk| {
            let chunk_words = tokenize(chunk);
            let overlap = query_words
                .iter()
                .filter(|w| chunk_words.contains(w))
                .count();
            (chunk.clone(), overlap as f32 / query_words.len() as f32)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_l2_index_ranks_nearest_vector_first() {
        let mut index = FlatL2Index::new();
        index.add(
            vec!["far".to_string(), "near".to_string()],
            vec![vec![10.0, 10.0], vec![0.1, 0.1]],
        );
        let results = index.search(&[0.0, 0.0], 1);
        assert_eq!(results[0].0, "near");
    }

    #[test]
    fn keyword_overlap_prefers_chunk_sharing_more_words() {
        let chunks = vec![
            "completely unrelated text about gardening".to_string(),
            "SaaS platform for B2B sales automation".to_string(),
        ];
        let ranked = keyword_overlap_rank(&chunks, "B2B sales SaaS platform", 2);
        assert_eq!(ranked[0].0, "SaaS platform for B2B sales automation");
    }
}
