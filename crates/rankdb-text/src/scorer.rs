use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use rankdb_core::traits::Retriever;
use rankdb_core::types::top_positions;
use rankdb_core::{Error, ScoredPosition};

use crate::artifacts::LexicalArtifacts;
use crate::tfidf::{TermMatrix, TfidfVectorizer};

/// Supported lexical similarity functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMethod {
	Cosine,
}

impl FromStr for SimilarityMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"cosine" => Ok(Self::Cosine),
			_ => Err(Error::InvalidSimilarityMethod(s.to_string())),
		}
	}
}

/// Scores a query against every row of the term matrix.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
	method: SimilarityMethod,
	vectorizer: TfidfVectorizer,
	matrix: TermMatrix,
}

impl LexicalScorer {
	/// Fails with `InvalidSimilarityMethod` for anything but `cosine`.
	pub fn new(method: &str, vectorizer: TfidfVectorizer, matrix: TermMatrix) -> Result<Self> {
		let method = method.parse::<SimilarityMethod>()?;
		if matrix.n_cols() != vectorizer.vocabulary_len() {
			return Err(Error::DimensionMismatch {
				expected: vectorizer.vocabulary_len(),
				got: matrix.n_cols(),
			}
			.into());
		}
		Ok(Self { method, vectorizer, matrix })
	}

	pub fn from_artifacts(method: &str, artifacts: LexicalArtifacts) -> Result<Self> {
		Self::new(method, artifacts.vectorizer, artifacts.matrix)
	}

	pub fn method(&self) -> SimilarityMethod {
		self.method
	}

	pub fn len(&self) -> usize {
		self.matrix.rows()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Full-length score vector; out-of-vocabulary queries score zero everywhere.
	pub fn score(&self, query: &str) -> Vec<f32> {
		match self.method {
			SimilarityMethod::Cosine => {
				let projected = self.vectorizer.project(query);
				debug!(terms = projected.indices.len(), "lexical query projected");
				self.matrix.dot_rows(&projected)
			}
		}
	}

	pub fn retrieve(&self, query: &str, top_n: usize) -> Vec<ScoredPosition> {
		top_positions(&self.score(query), top_n)
	}
}

#[async_trait]
impl Retriever for LexicalScorer {
	fn corpus_len(&self) -> usize {
		self.len()
	}

	async fn score(&self, query: &str) -> Result<Vec<f32>> {
		Ok(LexicalScorer::score(self, query))
	}

	async fn retrieve(&self, query: &str, top_n: usize) -> Result<Vec<ScoredPosition>> {
		Ok(LexicalScorer::retrieve(self, query, top_n))
	}
}
