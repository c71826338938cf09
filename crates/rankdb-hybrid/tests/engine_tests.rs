mod support;

use std::sync::Arc;

use rankdb_core::config::{RetrySettings, ScorerSettings, Settings};
use rankdb_core::{Error, SourceKind};
use rankdb_hybrid::{ArtifactLayout, HybridEngine, IndexingPipeline};
use rankdb_rerank::{RerankStage, TermOverlapReranker};
use rankdb_text::analyzer::AnalyzerConfig;
use rankdb_text::{LexicalArtifacts, LexicalScorer};
use rankdb_vector::embed_provider::LocalProvider;
use rankdb_vector::{DenseIndex, DenseScorer};
use support::{catalog, fields, BrokenReranker, BrokenRetriever, CountingProvider};
use tempfile::TempDir;

const NO_WAIT: RetrySettings = RetrySettings { retries: 1, delay_ms: 0 };

fn texts() -> Vec<String> {
    catalog().iter().map(|d| d.joined_text(&fields())).collect()
}

fn ids() -> Vec<String> {
    catalog().into_iter().map(|d| d.id).collect()
}

fn lexical() -> Arc<LexicalScorer> {
    let artifacts = LexicalArtifacts::fit(AnalyzerConfig::default(), &texts());
    Arc::new(LexicalScorer::from_artifacts("cosine", artifacts).unwrap())
}

async fn dense() -> Arc<DenseScorer> {
    let provider = LocalProvider::load("hashing", 256).unwrap();
    let purpose = rankdb_core::EmbedPurpose::Document;
    let vectors = rankdb_core::traits::EmbeddingProvider::embed(&provider, &texts(), purpose)
        .await
        .unwrap();
    let mut index = DenseIndex::new(256);
    index.add_batch(&ids(), &vectors).unwrap();
    Arc::new(DenseScorer::new(Arc::new(index), Arc::new(provider)).unwrap())
}

fn scorer(alpha: f32, top_n: usize) -> ScorerSettings {
    ScorerSettings { lexical_alpha: alpha, top_n }
}

#[tokio::test]
async fn retrieve_ids_ranks_best_match_first() {
    let engine = HybridEngine::new(lexical(), dense().await, ids(), &scorer(0.5, 3)).unwrap();
    let hits = engine.retrieve_ids("armchair").await;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "p4");
    assert!(hits.iter().all(|h| h.source == SourceKind::Hybrid));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn broken_signal_falls_back_to_placeholder_ranking() {
    let broken = Arc::new(BrokenRetriever { len: 5 });
    let engine = HybridEngine::new(lexical(), broken, ids(), &scorer(0.5, 10))
        .unwrap()
        .with_retrieve_retry(NO_WAIT);
    let hits = engine.retrieve_ids("armchair").await;
    assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["p1", "p2", "p3"]);
    assert!(hits.iter().all(|h| h.score == 0.0 && h.source == SourceKind::Fallback));
}

#[tokio::test]
async fn retrieve_docs_joins_catalog_records() {
    let mut partial = catalog();
    partial.retain(|d| d.id != "p3");
    let engine = HybridEngine::new(lexical(), dense().await, ids(), &scorer(1.0, 5))
        .unwrap()
        .with_catalog(partial);
    let docs = engine.retrieve_docs("desk lamp").await;
    assert!(docs.iter().all(|(d, _)| d.id != "p3"), "hits without a catalog row are dropped");
    assert_eq!(docs.len(), 4);
    assert!(docs.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(docs[0].0.field("title"), Some("Oak Desk"));
}

#[tokio::test]
async fn search_reranks_retrieved_candidates() {
    let stage = RerankStage::new(Arc::new(TermOverlapReranker), fields());
    let engine = HybridEngine::new(lexical(), dense().await, ids(), &scorer(0.5, 5))
        .unwrap()
        .with_catalog(catalog())
        .with_reranker(stage);
    let hits = engine.search("desk lamp", 2).await;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "p3");
    assert_eq!(hits[0].score, 1.0);
    assert!(hits.iter().all(|h| h.source == SourceKind::Reranked));
}

#[tokio::test]
async fn failed_rerank_keeps_retrieval_order() {
    let engine = HybridEngine::new(lexical(), dense().await, ids(), &scorer(1.0, 5))
        .unwrap()
        .with_catalog(catalog())
        .with_reranker(RerankStage::new(Arc::new(BrokenReranker), fields()))
        .with_rerank_retry(NO_WAIT);
    let retrieved: Vec<String> =
        engine.retrieve_ids("oak desk").await.into_iter().map(|h| h.id).collect();
    let hits = engine.search("oak desk", 3).await;
    assert_eq!(hits.iter().map(|h| h.id.clone()).collect::<Vec<_>>(), retrieved[..3].to_vec());
    assert!(hits.iter().all(|h| h.score == 0.0 && h.source == SourceKind::Fallback));
}

#[tokio::test]
async fn misaligned_retrievers_are_rejected() {
    let broken = Arc::new(BrokenRetriever { len: 4 });
    let result = HybridEngine::new(lexical(), broken, ids(), &scorer(0.5, 3));
    let err = result.err().unwrap();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::MisalignedScores { lexical: 5, dense: 4 })
    ));
}

#[tokio::test]
async fn engine_opens_what_the_pipeline_built() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path().join("artifacts"));
    let mut settings = Settings::default();
    settings.dense.provider = "hashing".into();
    settings.dense.output_dim = 128;
    settings.dense.max_batch = 2;
    settings.fields.embed = fields();
    settings.fields.rerank = fields();
    settings.scorer.top_n = 4;

    let provider = rankdb_vector::embed_provider::build_provider(&settings.dense)?;
    let report = IndexingPipeline::from_settings(&settings, provider, layout.clone())
        .run(&catalog())
        .await?;
    assert_eq!(report.provider_calls, 3);

    let engine = HybridEngine::open(&settings, &layout, catalog()).await?;
    assert_eq!(engine.corpus_len(), 5);
    let hits = engine.search("oak bookshelf", 2).await;
    assert_eq!(hits[0].id, "p5");
    assert_eq!(hits[0].source, SourceKind::Reranked);
    Ok(())
}

#[tokio::test]
async fn failed_reindex_keeps_lexical_and_dense_positions_aligned() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path().join("artifacts"));
    let mut settings = Settings::default();
    settings.dense.provider = "hashing".into();
    settings.dense.output_dim = 64;
    settings.fields.embed = fields();
    settings.fields.rerank = fields();
    settings.scorer.lexical_alpha = 1.0;
    settings.scorer.top_n = 1;

    let provider = rankdb_vector::embed_provider::build_provider(&settings.dense)?;
    IndexingPipeline::from_settings(&settings, provider, layout.clone()).run(&catalog()).await?;

    let mut reversed = catalog();
    reversed.reverse();
    let failing = Arc::new(CountingProvider::failing_on(1));
    let rebuild = IndexingPipeline::new(failing, layout.clone(), fields()).run(&reversed).await;
    assert!(rebuild.is_err());

    let artifacts = LexicalArtifacts::load(layout.lexical_dir())?;
    let lexical = LexicalScorer::from_artifacts("cosine", artifacts)?;
    let (index, _) = DenseIndex::load(&layout.vector_index_dir()).await?;
    let best = lexical.retrieve("bookshelf", 1);
    assert_eq!(index.id_at(best[0].position), Some("p5"));

    let engine = HybridEngine::open(&settings, &layout, catalog()).await?;
    let hits = engine.retrieve_ids("bookshelf").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "p5");
    assert_eq!(hits[0].source, SourceKind::Hybrid);
    Ok(())
}
