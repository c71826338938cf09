//! Domain types shared by the lexical, dense and reranking stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DocId = String;
pub type Fields = BTreeMap<String, String>;

/// A catalog item as seen by the engine.
///
/// - `id`: stable identifier used to join metadata back after ranking
/// - `fields`: named text fields; only a configured subset is ever read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<DocId>) -> Self {
        Self { id: id.into(), fields: Fields::new() }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Concatenate `names` in order with single spaces. Absent fields
    /// contribute an empty string so positions stay stable.
    pub fn joined_text<S: AsRef<str>>(&self, names: &[S]) -> String {
        names
            .iter()
            .map(|n| self.field(n.as_ref()).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Field names from `required` that at least one document lacks, in the
/// order they were requested.
pub fn missing_fields<S: AsRef<str>>(docs: &[Document], required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| docs.iter().any(|d| !d.fields.contains_key(*name)))
        .map(str::to_string)
        .collect()
}

/// A score attached to a corpus position (row of the term matrix, slot of
/// the vector index, or index into a candidate list).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosition {
    pub position: usize,
    pub score: f32,
}

impl ScoredPosition {
    pub fn new(position: usize, score: f32) -> Self {
        Self { position, score }
    }
}

/// Sort descending by score; equal scores keep the lower position first.
pub fn sort_by_score_desc(items: &mut [ScoredPosition]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
}

/// The `k` best positions of a full score vector, best first.
pub fn top_positions(scores: &[f32], k: usize) -> Vec<ScoredPosition> {
    let mut ranked: Vec<ScoredPosition> =
        scores.iter().enumerate().map(|(i, &s)| ScoredPosition::new(i, s)).collect();
    sort_by_score_desc(&mut ranked);
    ranked.truncate(k);
    ranked
}

/// Indicates which stage produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Lexical,
    Dense,
    Hybrid,
    Reranked,
    Fallback,
}

/// The externally visible ranked result.
///
/// `id` matches `Document::id`. Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub source: SourceKind,
}

/// What an embedding is going to be used for. Remote providers embed
/// queries and documents into slightly different spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedPurpose {
    Query,
    Document,
}
