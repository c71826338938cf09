use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use rankdb_core::text::truncate_to_token_budget;
use rankdb_core::traits::{EmbeddingProvider, Retriever};
use rankdb_core::{EmbedPurpose, Error, ScoredPosition};

use crate::index::{l2_normalize, DenseIndex};

/// Embeds a query through the provider and searches the dense index.
pub struct DenseScorer {
	index: Arc<DenseIndex>,
	provider: Arc<dyn EmbeddingProvider>,
	/// Positions kept by [`Retriever::score`]; `None` keeps the whole corpus.
	top_k: Option<usize>,
}

impl DenseScorer {
	pub fn new(index: Arc<DenseIndex>, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
		if provider.dim() != index.dim() {
			return Err(
				Error::DimensionMismatch { expected: index.dim(), got: provider.dim() }.into()
			);
		}
		Ok(Self { index, provider, top_k: None })
	}

	#[must_use]
	pub fn with_top_k(mut self, k: usize) -> Self {
		self.top_k = Some(k);
		self
	}

	pub fn index(&self) -> &DenseIndex {
		&self.index
	}

	/// Unit-length query embedding. A zero vector is rejected since its
	/// similarities carry no ranking information.
	pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let text = truncate_to_token_budget(query, self.provider.max_len());
		let mut embedded = self.provider.embed(&[text], EmbedPurpose::Query).await?;
		let mut vector = embedded
			.pop()
			.ok_or_else(|| Error::Provider("no embedding returned for query".into()))?;
		if vector.len() != self.index.dim() {
			return Err(
				Error::DimensionMismatch { expected: self.index.dim(), got: vector.len() }.into()
			);
		}
		if l2_normalize(&mut vector) == 0.0 {
			return Err(Error::DegenerateEmbedding.into());
		}
		Ok(vector)
	}

	/// Top `k` positions by inner product, best first.
	pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPosition>> {
		let q = self.embed_query(query).await?;
		let hits = self.index.search(&q, k)?;
		debug!(k, hits = hits.len(), "dense search");
		Ok(hits)
	}

	/// Corpus-length vector holding the similarity at each of the top `k`
	/// positions and zero everywhere else.
	pub async fn score_unsorted(&self, query: &str, k: usize) -> Result<Vec<f32>> {
		let hits = self.search(query, k).await?;
		let mut scores = vec![0.0; self.index.len()];
		for hit in hits {
			scores[hit.position] = hit.score;
		}
		Ok(scores)
	}
}

#[async_trait]
impl Retriever for DenseScorer {
	fn corpus_len(&self) -> usize {
		self.index.len()
	}

	async fn score(&self, query: &str) -> Result<Vec<f32>> {
		self.score_unsorted(query, self.top_k.unwrap_or(self.index.len())).await
	}

	async fn retrieve(&self, query: &str, top_n: usize) -> Result<Vec<ScoredPosition>> {
		self.search(query, top_n).await
	}
}
