//! Online retrieval: both signals, mixture, identifier join, optional rerank.
//!
//! Everything reachable from a caller is wrapped in a resilience policy, so
//! these methods never return an error. A failed retrieval degrades to the
//! first few corpus positions and a failed rerank keeps retrieval order.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use rankdb_core::config::{RetrySettings, ScorerSettings, Settings};
use rankdb_core::resilience::{
    placeholder_ranking, with_resilience_outcome, Resolution, ResiliencePolicy,
};
use rankdb_core::traits::Retriever;
use rankdb_core::{DocId, Document, Error, ScoredPosition, SearchHit, SourceKind};
use rankdb_rerank::stage::keep_order;
use rankdb_rerank::{build_reranker, RerankStage};
use rankdb_text::{LexicalArtifacts, LexicalScorer};
use rankdb_vector::embed_provider::build_provider;
use rankdb_vector::{DenseIndex, DenseScorer};

use crate::artifacts::ArtifactLayout;
use crate::mixture::score_mixture;

/// Size of the static ranking served when retrieval fails.
pub const FALLBACK_SIZE: usize = 3;

pub struct HybridEngine {
    lexical: Arc<dyn Retriever>,
    dense: Arc<dyn Retriever>,
    ids: Vec<DocId>,
    catalog: HashMap<DocId, Document>,
    reranker: Option<RerankStage>,
    alpha: f32,
    top_n: usize,
    retrieve_policy: ResiliencePolicy<str, Vec<ScoredPosition>>,
    rerank_retry: RetrySettings,
}

impl HybridEngine {
    /// `ids[i]` names corpus position `i` for both retrievers.
    pub fn new(
        lexical: Arc<dyn Retriever>,
        dense: Arc<dyn Retriever>,
        ids: Vec<DocId>,
        scorer: &ScorerSettings,
    ) -> Result<Self> {
        if lexical.corpus_len() != dense.corpus_len() {
            return Err(Error::MisalignedScores {
                lexical: lexical.corpus_len(),
                dense: dense.corpus_len(),
            }
            .into());
        }
        if ids.len() != lexical.corpus_len() {
            let corpus = lexical.corpus_len();
            let msg = format!("{} ids for a corpus of {corpus}", ids.len());
            return Err(Error::Operation(msg).into());
        }
        if !(0.0..=1.0).contains(&scorer.lexical_alpha) {
            return Err(Error::InvalidMixtureWeight(scorer.lexical_alpha).into());
        }
        let fallback_len = ids.len().min(FALLBACK_SIZE);
        let retrieve_policy = ResiliencePolicy::from_settings(&RetrySettings::default())
            .with_fallback(move |_query: &str| placeholder_ranking(fallback_len));
        Ok(Self {
            lexical,
            dense,
            ids,
            catalog: HashMap::new(),
            reranker: None,
            alpha: scorer.lexical_alpha,
            top_n: scorer.top_n,
            retrieve_policy,
            rerank_retry: RetrySettings::default(),
        })
    }

    /// Load every artifact under `layout` and wire providers from `settings`.
    pub async fn open(
        settings: &Settings,
        layout: &ArtifactLayout,
        catalog: Vec<Document>,
    ) -> Result<Self> {
        let artifacts = LexicalArtifacts::load(layout.lexical_dir())?;
        let lexical = LexicalScorer::from_artifacts(&settings.lexical.similarity, artifacts)?;
        let (index, manifest) = DenseIndex::load(&layout.vector_index_dir()).await?;
        let provider = build_provider(&settings.dense)?;
        if manifest.embedder_id != provider.embedder_id() {
            warn!(
                built_with = %manifest.embedder_id,
                serving_with = %provider.embedder_id(),
                "embedder differs from the one that built the index"
            );
        }
        let ids = index.ids().to_vec();
        let dense = DenseScorer::new(Arc::new(index), provider)?;
        let reranker =
            RerankStage::new(build_reranker(&settings.rerank)?, settings.fields.rerank.clone());

        Ok(Self::new(Arc::new(lexical), Arc::new(dense), ids, &settings.scorer)?
            .with_catalog(catalog)
            .with_reranker(reranker)
            .with_retrieve_retry(settings.resilience.retrieve)
            .with_rerank_retry(settings.resilience.rerank))
    }

    #[must_use]
    pub fn with_catalog(mut self, docs: Vec<Document>) -> Self {
        self.catalog = docs.into_iter().map(|d| (d.id.clone(), d)).collect();
        self
    }

    #[must_use]
    pub fn with_reranker(mut self, reranker: RerankStage) -> Self {
        self.reranker = Some(reranker);
        self
    }

    #[must_use]
    pub fn with_retrieve_retry(mut self, retry: RetrySettings) -> Self {
        self.retrieve_policy.retries = retry.retries;
        self.retrieve_policy.delay = retry.delay();
        self
    }

    #[must_use]
    pub fn with_rerank_retry(mut self, retry: RetrySettings) -> Self {
        self.rerank_retry = retry;
        self
    }

    pub fn corpus_len(&self) -> usize {
        self.ids.len()
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.catalog.get(id)
    }

    /// Lexical and dense scoring run concurrently; the mixture waits for both.
    pub async fn rank_positions(&self, query: &str) -> Result<Vec<ScoredPosition>> {
        let (lexical, dense) = futures::join!(self.lexical.score(query), self.dense.score(query));
        let ranked = score_mixture(&lexical?, &dense?, self.alpha, self.top_n)?;
        debug!(query, hits = ranked.len(), "mixture ranked");
        Ok(ranked)
    }

    async fn retrieve_positions(&self, query: &str) -> (Vec<ScoredPosition>, SourceKind) {
        let outcome = with_resilience_outcome("retrieve", &self.retrieve_policy, query, move |q| {
            self.rank_positions(q)
        })
        .await;
        let source = match outcome.resolution {
            Resolution::Succeeded => SourceKind::Hybrid,
            Resolution::Fallback | Resolution::Default => SourceKind::Fallback,
        };
        (outcome.value, source)
    }

    /// Ranked identifiers, best first. Never fails: a broken signal yields
    /// the static placeholder ranking tagged [`SourceKind::Fallback`].
    pub async fn retrieve_ids(&self, query: &str) -> Vec<SearchHit> {
        let (ranked, source) = self.retrieve_positions(query).await;
        ranked
            .into_iter()
            .filter_map(|r| {
                let id = self.ids.get(r.position)?.clone();
                Some(SearchHit { id, score: r.score, source })
            })
            .collect()
    }

    /// Retrieved hits joined to their catalog records, best first.
    /// Hits without a catalog entry are dropped.
    pub async fn retrieve_docs(&self, query: &str) -> Vec<(Document, f32)> {
        self.join(self.retrieve_ids(query).await)
            .into_iter()
            .map(|(doc, hit)| (doc, hit.score))
            .collect()
    }

    fn join(&self, hits: Vec<SearchHit>) -> Vec<(Document, SearchHit)> {
        hits.into_iter()
            .filter_map(|hit| self.catalog.get(&hit.id).map(|doc| (doc.clone(), hit)))
            .collect()
    }

    /// Retrieve, then rerank the joined candidates down to `rerank_top_n`.
    /// Without a reranker the retrieval hits are returned as they are.
    pub async fn search(&self, query: &str, rerank_top_n: usize) -> Vec<SearchHit> {
        let hits = self.retrieve_ids(query).await;
        let Some(stage) = &self.reranker else {
            return hits;
        };
        let candidates: Vec<Document> = self.join(hits).into_iter().map(|(doc, _)| doc).collect();
        let count = candidates.len();

        let policy = ResiliencePolicy::from_settings(&self.rerank_retry)
            .with_fallback(move |_query: &str| keep_order(count, rerank_top_n));
        let outcome = with_resilience_outcome("rerank", &policy, query, |q| {
            stage.rerank_ids(q, &candidates, rerank_top_n)
        })
        .await;
        let source = match outcome.resolution {
            Resolution::Succeeded => SourceKind::Reranked,
            Resolution::Fallback | Resolution::Default => SourceKind::Fallback,
        };
        outcome
            .value
            .into_iter()
            .filter_map(|r| {
                let doc = candidates.get(r.position)?;
                Some(SearchHit { id: doc.id.clone(), score: r.score, source })
            })
            .collect()
    }
}
