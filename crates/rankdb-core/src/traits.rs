use async_trait::async_trait;

use crate::types::{EmbedPurpose, ScoredPosition};

/// A local, synchronous embedding model.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Turns text into vectors. Calls are suspension points: implementations
/// either talk to a remote service or push work onto the blocking pool.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `cohere:embed-v4.0:d1024`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Token budget per input text; `0` means unbounded.
    fn max_len(&self) -> usize;
    async fn embed(&self, texts: &[String], purpose: EmbedPurpose) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Cross-encoder style relevance scoring over a whole candidate batch in
/// one round trip. Returned positions index into `documents`.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> anyhow::Result<Vec<ScoredPosition>>;
}

/// A relevance signal over a fixed, position-ordered corpus.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Number of corpus positions this retriever scores.
    fn corpus_len(&self) -> usize;
    /// Full-length score vector aligned to corpus position.
    async fn score(&self, query: &str) -> anyhow::Result<Vec<f32>>;
    /// Best `top_n` positions, highest score first.
    async fn retrieve(&self, query: &str, top_n: usize) -> anyhow::Result<Vec<ScoredPosition>>;
}
