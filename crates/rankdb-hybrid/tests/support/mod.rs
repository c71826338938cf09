//! Test doubles shared by the pipeline and engine tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use rankdb_core::traits::{EmbeddingProvider, RerankProvider, Retriever};
use rankdb_core::{Document, EmbedPurpose, ScoredPosition};

pub const DIM: usize = 4;

/// Deterministic embeddings; counts calls and can fail a given call.
pub struct CountingProvider {
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
    fail_on_call: Option<usize>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0), batch_sizes: Mutex::new(Vec::new()), fail_on_call: None }
    }

    /// Call number `n` (1-based) fails; the others succeed.
    pub fn failing_on(n: usize) -> Self {
        Self { fail_on_call: Some(n), ..Self::new() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

pub fn embed_text(text: &str) -> Vec<f32> {
    vec![1.0, text.len() as f32, text.split_whitespace().count() as f32, 0.5]
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    fn embedder_id(&self) -> &str {
        "counting:d4"
    }
    fn dim(&self) -> usize {
        DIM
    }
    fn max_len(&self) -> usize {
        0
    }
    async fn embed(
        &self,
        texts: &[String],
        _purpose: EmbedPurpose,
    ) -> anyhow::Result<Vec<Vec<f32>>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(n) {
            return Err(anyhow!("quota exceeded on call {n}"));
        }
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }
}

/// A retriever whose every call fails.
pub struct BrokenRetriever {
    pub len: usize,
}

#[async_trait]
impl Retriever for BrokenRetriever {
    fn corpus_len(&self) -> usize {
        self.len
    }
    async fn score(&self, _query: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow!("embedding service unavailable"))
    }
    async fn retrieve(&self, _query: &str, _top_n: usize) -> anyhow::Result<Vec<ScoredPosition>> {
        Err(anyhow!("embedding service unavailable"))
    }
}

pub struct BrokenReranker;

#[async_trait]
impl RerankProvider for BrokenReranker {
    async fn rerank(
        &self,
        _query: &str,
        _documents: &[String],
        _top_n: usize,
    ) -> anyhow::Result<Vec<ScoredPosition>> {
        Err(anyhow!("rerank service unavailable"))
    }
}

pub fn catalog() -> Vec<Document> {
    [
        ("p1", "Oak Desk", "solid oak writing desk"),
        ("p2", "Floor Lamp", "tall brass floor lamp"),
        ("p3", "Desk Lamp", "led lamp for the desk"),
        ("p4", "Armchair", "soft grey armchair"),
        ("p5", "Bookshelf", "oak bookshelf with five shelves"),
    ]
    .into_iter()
    .map(|(id, title, description)| {
        Document::new(id).with_field("title", title).with_field("description", description)
    })
    .collect()
}

pub fn fields() -> Vec<String> {
    vec!["title".to_string(), "description".to_string()]
}
