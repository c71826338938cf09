use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use rankdb_core::resilience::placeholder_ranking;
use rankdb_core::traits::RerankProvider;
use rankdb_core::types::sort_by_score_desc;
use rankdb_core::{Document, Error, ScoredPosition};

/// Reorders candidates with one provider round trip per call.
#[derive(Clone)]
pub struct RerankStage {
    provider: Arc<dyn RerankProvider>,
    fields: Vec<String>,
}

impl RerankStage {
    /// `fields` are joined, in order, into each candidate's text.
    pub fn new(provider: Arc<dyn RerankProvider>, fields: Vec<String>) -> Self {
        Self { provider, fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn candidate_texts(&self, candidates: &[Document]) -> Vec<String> {
        candidates.iter().map(|d| d.joined_text(&self.fields)).collect()
    }

    /// Best `top_n` candidates as (index into `candidates`, relevance), best first.
    pub async fn rerank_ids(
        &self,
        query: &str,
        candidates: &[Document],
        top_n: usize,
    ) -> Result<Vec<ScoredPosition>> {
        if candidates.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }
        let texts = self.candidate_texts(candidates);
        let mut ranked = self.provider.rerank(query, &texts, top_n.min(candidates.len())).await?;
        if let Some(bad) = ranked.iter().find(|r| r.position >= candidates.len()) {
            return Err(Error::Provider(format!(
                "reranker returned position {} for {} candidates",
                bad.position,
                candidates.len()
            ))
            .into());
        }
        sort_by_score_desc(&mut ranked);
        ranked.truncate(top_n);
        debug!(candidates = candidates.len(), returned = ranked.len(), "reranked");
        Ok(ranked)
    }

    /// Same ranking as [`rerank_ids`](Self::rerank_ids), returned as the candidate records.
    pub async fn rerank_docs(
        &self,
        query: &str,
        candidates: &[Document],
        top_n: usize,
    ) -> Result<Vec<(Document, f32)>> {
        let ranked = self.rerank_ids(query, candidates, top_n).await?;
        Ok(ranked.into_iter().map(|r| (candidates[r.position].clone(), r.score)).collect())
    }
}

/// Rerank fallback: the incoming order, cut to `top_n`, every score 0.
pub fn keep_order(candidates: usize, top_n: usize) -> Vec<ScoredPosition> {
    placeholder_ranking(candidates.min(top_n))
}
