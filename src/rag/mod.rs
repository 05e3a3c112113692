//! RAG context store: chunking, embedding, and keyword-overlap degradation.

pub mod embedding;
pub mod store;

pub use embedding::{EmbeddingProvider, FlatL2Index, VectorIndex};
pub use store::{chunk_text, RagQueryResult, RagStore};
