//! Offline build of every serving artifact.
//!
//! Order of work: validate the corpus and fit the lexical model, embed in
//! provider-sized batches with a checkpoint append after each one, then
//! normalize everything into a fresh dense index and save it. The lexical
//! artifacts are written only after the dense index is in place, so a run
//! that fails part way leaves the previous pair untouched. Validation
//! failures happen before any provider call.

use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use rankdb_core::config::{RetrySettings, Settings};
use rankdb_core::resilience::retry;
use rankdb_core::text::truncate_to_token_budget;
use rankdb_core::traits::EmbeddingProvider;
use rankdb_core::types::missing_fields;
use rankdb_core::{DocId, Document, EmbedPurpose, Error};
use rankdb_text::analyzer::AnalyzerConfig;
use rankdb_text::LexicalArtifacts;
use rankdb_vector::{content_hash, DenseIndex, EmbeddingCheckpoint};

use crate::artifacts::ArtifactLayout;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingReport {
    pub documents: usize,
    pub vocabulary: usize,
    /// Positions recovered from a previous run's checkpoint.
    pub resumed_from: usize,
    pub batches: usize,
    /// Embedding calls issued, retries included.
    pub provider_calls: u32,
    pub checkpoints_written: usize,
    pub embedder_id: String,
}

pub struct IndexingPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    layout: ArtifactLayout,
    embed_fields: Vec<String>,
    analyzer: AnalyzerConfig,
    max_batch: usize,
    retry: RetrySettings,
    resume: bool,
    progress: bool,
}

impl IndexingPipeline {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        layout: ArtifactLayout,
        embed_fields: Vec<String>,
    ) -> Self {
        Self {
            provider,
            layout,
            embed_fields,
            analyzer: AnalyzerConfig::default(),
            max_batch: 96,
            retry: RetrySettings { retries: 0, delay_ms: 0 },
            resume: false,
            progress: false,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        provider: Arc<dyn EmbeddingProvider>,
        layout: ArtifactLayout,
    ) -> Self {
        Self::new(provider, layout, settings.fields.embed.clone())
            .with_analyzer(AnalyzerConfig {
                stop_words: settings.lexical.stop_words,
                min_token_chars: settings.lexical.min_token_chars,
            })
            .with_batch_size(settings.dense.max_batch)
            .with_retry(settings.resilience.pipeline)
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Clamped to at least one document per call.
    #[must_use]
    pub fn with_batch_size(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn validate(&self, docs: &[Document]) -> Result<()> {
        if docs.is_empty() {
            return Err(Error::EmptyCorpus.into());
        }
        let missing = missing_fields(docs, &self.embed_fields);
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing).into());
        }
        Ok(())
    }

    pub async fn run(&self, docs: &[Document]) -> Result<IndexingReport> {
        self.validate(docs)?;
        let texts: Vec<String> = docs.iter().map(|d| d.joined_text(&self.embed_fields)).collect();
        let ids: Vec<DocId> = docs.iter().map(|d| d.id.clone()).collect();
        info!(documents = docs.len(), fields = ?self.embed_fields, "indexing started");

        let lexical = LexicalArtifacts::fit(self.analyzer, &texts);

        let dim = self.provider.dim();
        let hashes: Vec<String> = texts.iter().map(|t| content_hash(t)).collect();
        let checkpoint = EmbeddingCheckpoint::new(self.layout.checkpoint_dir(), dim);
        let mut vectors = if self.resume {
            self.recover(&checkpoint, &ids, &hashes, dim).await?
        } else {
            checkpoint.remove()?;
            Vec::new()
        };
        let resumed_from = vectors.len();

        let remaining = docs.len() - resumed_from;
        let batches = remaining.div_ceil(self.max_batch);
        let pb = self.progress_bar(batches);
        let mut provider_calls = 0u32;
        let mut checkpoints_written = 0usize;

        for start in (resumed_from..docs.len()).step_by(self.max_batch) {
            let end = (start + self.max_batch).min(docs.len());
            let budget = self.provider.max_len();
            let batch: Vec<String> =
                texts[start..end].iter().map(|t| truncate_to_token_budget(t, budget)).collect();

            let (retries, delay) = (self.retry.retries, self.retry.delay());
            let outcome = retry("embed_batch", retries, delay, batch.as_slice(), |chunk| {
                self.provider.embed(chunk, EmbedPurpose::Document)
            })
            .await;
            provider_calls += outcome.attempts;
            let embedded =
                outcome.result.with_context(|| format!("embedding documents {start}..{end}"))?;
            if embedded.len() != batch.len() {
                let msg = format!("asked for {} embeddings, got {}", batch.len(), embedded.len());
                return Err(Error::Provider(msg).into());
            }

            checkpoint.append(start, &ids[start..end], &hashes[start..end], &embedded).await?;
            checkpoints_written += 1;
            vectors.extend(embedded);
            pb.inc(1);
            debug!(start, end, "batch embedded");
        }
        pb.finish_and_clear();

        let mut index = DenseIndex::new(dim);
        index.add_batch(&ids, &vectors)?;
        index.save(&self.layout.vector_index_dir(), self.provider.embedder_id()).await?;
        lexical.save(self.layout.lexical_dir())?;
        checkpoint.remove()?;

        let report = IndexingReport {
            documents: docs.len(),
            vocabulary: lexical.vectorizer.vocabulary_len(),
            resumed_from,
            batches,
            provider_calls,
            checkpoints_written,
            embedder_id: self.provider.embedder_id().to_string(),
        };
        info!(?report, "indexing finished");
        Ok(report)
    }

    /// Vectors from a previous run's checkpoint, if every row still lines up
    /// with the corpus; otherwise the checkpoint is discarded.
    async fn recover(
        &self,
        checkpoint: &EmbeddingCheckpoint,
        ids: &[DocId],
        hashes: &[String],
        dim: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let rows = checkpoint.load().await?;
        let consistent = rows.len() <= ids.len()
            && rows.iter().enumerate().all(|(i, row)| {
                row.position == i
                    && row.id == ids[i]
                    && row.content_hash == hashes[i]
                    && row.vector.len() == dim
            });
        if !consistent {
            warn!(rows = rows.len(), "checkpoint does not match the corpus, starting over");
            checkpoint.remove()?;
            return Ok(Vec::new());
        }
        if !rows.is_empty() {
            info!(rows = rows.len(), "resuming from checkpoint");
        }
        Ok(rows.into_iter().map(|r| r.vector).collect())
    }

    fn progress_bar(&self, batches: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(batches as u64);
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}
