use anyhow::Result;
use async_trait::async_trait;

use rankdb_core::traits::RerankProvider;
use rankdb_core::types::top_positions;
use rankdb_core::ScoredPosition;

/// Scores each document by the fraction of query words it contains.
/// No model, no network; useful offline and as a cheap baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapReranker;

impl TermOverlapReranker {
    pub fn score(query: &str, document: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return 0.0;
        }
        let content_lower = document.to_lowercase();
        let hits = query_words.iter().filter(|w| content_lower.contains(*w)).count();
        hits as f32 / query_words.len() as f32
    }
}

#[async_trait]
impl RerankProvider for TermOverlapReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<ScoredPosition>> {
        let scores: Vec<f32> = documents.iter().map(|d| Self::score(query, d)).collect();
        Ok(top_positions(&scores, top_n))
    }
}
