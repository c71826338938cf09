mod support;

use std::sync::Arc;

use rankdb_core::{Document, Error};
use rankdb_hybrid::{ArtifactLayout, IndexingPipeline};
use rankdb_text::LexicalArtifacts;
use rankdb_vector::{DenseIndex, EmbeddingCheckpoint};
use support::{catalog, embed_text, fields, CountingProvider, DIM};
use tempfile::TempDir;

fn pipeline(
    provider: Arc<CountingProvider>,
    layout: &ArtifactLayout,
    batch: usize,
) -> IndexingPipeline {
    IndexingPipeline::new(provider, layout.clone(), fields()).with_batch_size(batch)
}

#[tokio::test]
async fn missing_field_fails_before_any_embedding_call() {
    let tmp = TempDir::new().unwrap();
    let layout = ArtifactLayout::new(tmp.path());
    let docs = vec![
        Document::new("1").with_field("title", "Oak Desk").with_field("description", "solid oak"),
        Document::new("2").with_field("title", "Floor Lamp"),
        Document::new("3").with_field("title", "Armchair").with_field("description", "soft"),
    ];
    let provider = Arc::new(CountingProvider::new());

    let err = pipeline(provider.clone(), &layout, 2).run(&docs).await.unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::MissingColumns(cols)) => assert_eq!(cols, &vec!["description".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.calls(), 0);
    assert!(!LexicalArtifacts::exists(layout.lexical_dir()));
}

#[tokio::test]
async fn empty_corpus_fails_fast() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(CountingProvider::new());
    let layout = ArtifactLayout::new(tmp.path());
    let err = pipeline(provider.clone(), &layout, 2).run(&[]).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyCorpus)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn five_documents_in_batches_of_two() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());
    let provider = Arc::new(CountingProvider::new());

    let report = pipeline(provider.clone(), &layout, 2).run(&catalog()).await?;
    assert_eq!(provider.calls(), 3);
    assert_eq!(provider.batch_sizes(), vec![2, 2, 1]);
    assert_eq!(report.provider_calls, 3);
    assert_eq!(report.checkpoints_written, 3);
    assert_eq!(report.batches, 3);
    assert_eq!(report.documents, 5);
    assert!(!layout.checkpoint_dir().exists(), "checkpoint removed after the index is written");

    let (index, manifest) = DenseIndex::load(&layout.vector_index_dir()).await?;
    assert_eq!(manifest.count, 5);
    assert_eq!(manifest.dim, DIM);
    assert_eq!(manifest.embedder_id, "counting:d4");
    assert_eq!(index.ids(), &["p1", "p2", "p3", "p4", "p5"].map(String::from));
    let norm: f32 = index.vector(2).unwrap().iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-6);

    let lexical = LexicalArtifacts::load(layout.lexical_dir())?;
    assert_eq!(lexical.matrix.rows(), 5);
    Ok(())
}

#[tokio::test]
async fn failed_batch_leaves_checkpoint_then_resume_finishes() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());

    let flaky = Arc::new(CountingProvider::failing_on(2));
    assert!(pipeline(flaky.clone(), &layout, 2).run(&catalog()).await.is_err());
    assert_eq!(flaky.calls(), 2);
    assert!(!layout.vector_index_dir().exists());
    assert!(!LexicalArtifacts::exists(layout.lexical_dir()));

    let rows = EmbeddingCheckpoint::new(layout.checkpoint_dir(), DIM).load().await?;
    assert_eq!(rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["p1", "p2"]);

    let healthy = Arc::new(CountingProvider::new());
    let report = pipeline(healthy.clone(), &layout, 2).with_resume(true).run(&catalog()).await?;
    assert_eq!(report.resumed_from, 2);
    assert_eq!(healthy.batch_sizes(), vec![2, 1]);
    assert_eq!(report.checkpoints_written, 2);

    let (index, _) = DenseIndex::load(&layout.vector_index_dir()).await?;
    assert_eq!(index.len(), 5);
    let mut expected = embed_text(&catalog()[0].joined_text(&fields()));
    let norm = expected.iter().map(|x| x * x).sum::<f32>().sqrt();
    expected.iter_mut().for_each(|x| *x /= norm);
    assert_eq!(index.vector(0).unwrap(), expected.as_slice());
    assert!(!layout.checkpoint_dir().exists());
    Ok(())
}

#[tokio::test]
async fn stale_checkpoint_is_discarded_without_resume() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());
    let failing = Arc::new(CountingProvider::failing_on(2));
    assert!(pipeline(failing, &layout, 2).run(&catalog()).await.is_err());

    let provider = Arc::new(CountingProvider::new());
    let report = pipeline(provider.clone(), &layout, 2).run(&catalog()).await?;
    assert_eq!(report.resumed_from, 0);
    assert_eq!(provider.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn resume_ignores_checkpoint_for_changed_corpus() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());
    let failing = Arc::new(CountingProvider::failing_on(2));
    assert!(pipeline(failing, &layout, 2).run(&catalog()).await.is_err());

    let mut edited = catalog();
    edited[1] = Document::new("p2")
        .with_field("title", "Floor Lamp")
        .with_field("description", "now in black");
    let provider = Arc::new(CountingProvider::new());
    let report = pipeline(provider.clone(), &layout, 2).with_resume(true).run(&edited).await?;
    assert_eq!(report.resumed_from, 0);
    assert_eq!(provider.batch_sizes(), vec![2, 2, 1]);
    Ok(())
}

#[tokio::test]
async fn transient_failure_is_retried_within_the_batch() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());
    let provider = Arc::new(CountingProvider::failing_on(1));
    let report = pipeline(provider.clone(), &layout, 2)
        .with_retry(rankdb_core::config::RetrySettings { retries: 1, delay_ms: 0 })
        .run(&catalog())
        .await?;
    assert_eq!(report.provider_calls, 4);
    assert_eq!(report.checkpoints_written, 3);
    Ok(())
}

#[tokio::test]
async fn failed_rebuild_leaves_previous_artifacts_in_place() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let layout = ArtifactLayout::new(tmp.path());
    pipeline(Arc::new(CountingProvider::new()), &layout, 2).run(&catalog()).await?;
    let before = LexicalArtifacts::load(layout.lexical_dir())?;

    let mut reversed = catalog();
    reversed.reverse();
    let failing = Arc::new(CountingProvider::failing_on(1));
    assert!(pipeline(failing, &layout, 2).run(&reversed).await.is_err());

    let after = LexicalArtifacts::load(layout.lexical_dir())?;
    assert_eq!(after.matrix, before.matrix);
    let (index, _) = DenseIndex::load(&layout.vector_index_dir()).await?;
    assert_eq!(index.ids(), &["p1", "p2", "p3", "p4", "p5"].map(String::from));
    Ok(())
}
