//! Local embedding provider using the crate `rankdb-embed`.
//!
//! Model inference is CPU-bound, so every call is moved onto tokio's
//! blocking pool and awaited from there.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use rankdb_core::traits::{Embedder, EmbeddingProvider};
use rankdb_core::EmbedPurpose;
use rankdb_embed::load_embedder;

pub struct LocalProvider {
    inner: Arc<dyn Embedder>,
    id: String,
}

impl LocalProvider {
    pub fn new(name: &str, inner: Arc<dyn Embedder>) -> Self {
        let id = format!("local:{}:d{}", name, inner.dim());
        Self { inner, id }
    }

    /// `kind` is `hashing` (width `dim`) or `local` (BGE-M3).
    pub fn load(kind: &str, dim: usize) -> Result<Self> {
        Ok(Self::new(kind, Arc::from(load_embedder(kind, dim)?)))
    }
}

#[async_trait]
impl EmbeddingProvider for LocalProvider {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn max_len(&self) -> usize {
        self.inner.max_len()
    }

    async fn embed(&self, texts: &[String], _purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.embed_batch(&texts)).await?
    }
}
