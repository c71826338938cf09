//! TF-IDF weighting over a frozen vocabulary.
//!
//! Weights follow the smoothed scheme: `idf(t) = ln((1 + n) / (1 + df(t))) + 1`,
//! row weight = raw term count × idf, each row L2-normalized. Queries are
//! projected into the same column space; unknown terms are dropped.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rankdb_core::Error;

use crate::analyzer::{Analyzer, AnalyzerConfig};

/// A sparse vector with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
	pub indices: Vec<u32>,
	pub values: Vec<f32>,
}

impl SparseVector {
	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}
}

/// Row-compressed document-term matrix. Row `i` is corpus position `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatrix {
	n_cols: usize,
	indptr: Vec<usize>,
	indices: Vec<u32>,
	data: Vec<f32>,
}

impl TermMatrix {
	fn empty(n_cols: usize) -> Self {
		Self { n_cols, indptr: vec![0], indices: Vec::new(), data: Vec::new() }
	}

	fn push_row(&mut self, row: SparseVector) {
		self.indices.extend(row.indices);
		self.data.extend(row.values);
		self.indptr.push(self.indices.len());
	}

	pub fn rows(&self) -> usize {
		self.indptr.len().saturating_sub(1)
	}

	pub fn n_cols(&self) -> usize {
		self.n_cols
	}

	pub fn nnz(&self) -> usize {
		self.data.len()
	}

	pub fn row(&self, i: usize) -> (&[u32], &[f32]) {
		let (start, end) = (self.indptr[i], self.indptr[i + 1]);
		(&self.indices[start..end], &self.data[start..end])
	}

	/// Dot product of every row with `query`, in row order.
	pub fn dot_rows(&self, query: &SparseVector) -> Vec<f32> {
		if query.is_empty() {
			return vec![0.0; self.rows()];
		}
		let mut dense = vec![0.0f32; self.n_cols];
		for (&col, &value) in query.indices.iter().zip(&query.values) {
			dense[col as usize] = value;
		}
		(0..self.rows())
			.map(|i| {
				let (cols, values) = self.row(i);
				cols.iter().zip(values).map(|(&c, &v)| v * dense[c as usize]).sum()
			})
			.collect()
	}

	/// Structural checks for a matrix read back from disk.
	pub fn validate(&self) -> Result<()> {
		let well_formed = !self.indptr.is_empty()
			&& self.indptr[0] == 0
			&& self.indptr.windows(2).all(|w| w[0] <= w[1])
			&& self.indptr.last() == Some(&self.indices.len())
			&& self.indices.len() == self.data.len()
			&& self.indices.iter().all(|&c| (c as usize) < self.n_cols);
		if !well_formed {
			return Err(Error::Operation("term matrix is malformed".into()).into());
		}
		Ok(())
	}
}

#[derive(Serialize, Deserialize)]
struct VectorizerState {
	analyzer: AnalyzerConfig,
	/// Column order; index into this list is the column id.
	terms: Vec<String>,
	idf: Vec<f32>,
}

/// Fitted vocabulary and idf weights.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
	analyzer: Analyzer,
	terms: Vec<String>,
	columns: HashMap<String, u32>,
	idf: Vec<f32>,
}

impl TfidfVectorizer {
	/// Learn the vocabulary and document frequencies of `docs`.
	pub fn fit<S: AsRef<str>>(config: AnalyzerConfig, docs: &[S]) -> Self {
		let analyzer = Analyzer::new(config);
		let mut df: BTreeMap<String, u32> = BTreeMap::new();
		for doc in docs {
			let mut seen = analyzer.tokenize(doc.as_ref());
			seen.sort_unstable();
			seen.dedup();
			for term in seen {
				*df.entry(term).or_default() += 1;
			}
		}
		if df.is_empty() {
			warn!(
				documents = docs.len(),
				"fitted an empty vocabulary; every lexical score will be zero"
			);
		}

		let n = docs.len() as f64;
		let mut terms = Vec::with_capacity(df.len());
		let mut idf = Vec::with_capacity(df.len());
		for (term, count) in df {
			idf.push((((1.0 + n) / (1.0 + f64::from(count))).ln() + 1.0) as f32);
			terms.push(term);
		}
		debug!(documents = docs.len(), terms = terms.len(), "fitted tf-idf vocabulary");
		Self::from_parts(analyzer, terms, idf)
	}

	pub fn fit_transform<S: AsRef<str>>(config: AnalyzerConfig, docs: &[S]) -> (Self, TermMatrix) {
		let vectorizer = Self::fit(config, docs);
		let matrix = vectorizer.transform(docs);
		(vectorizer, matrix)
	}

	fn from_parts(analyzer: Analyzer, terms: Vec<String>, idf: Vec<f32>) -> Self {
		let columns = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as u32)).collect();
		Self { analyzer, terms, columns, idf }
	}

	pub fn vocabulary_len(&self) -> usize {
		self.terms.len()
	}

	pub fn analyzer_config(&self) -> AnalyzerConfig {
		self.analyzer.config()
	}

	pub fn column(&self, term: &str) -> Option<u32> {
		self.columns.get(term).copied()
	}

	pub fn idf(&self, term: &str) -> Option<f32> {
		self.column(term).map(|c| self.idf[c as usize])
	}

	/// Unit-length weight vector of one text in the fitted column space.
	/// All-unknown text yields the empty vector.
	pub fn project(&self, text: &str) -> SparseVector {
		let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
		for term in self.analyzer.tokenize(text) {
			if let Some(col) = self.column(&term) {
				*counts.entry(col).or_default() += 1;
			}
		}
		let mut vector = SparseVector {
			indices: Vec::with_capacity(counts.len()),
			values: Vec::with_capacity(counts.len()),
		};
		for (col, count) in counts {
			vector.indices.push(col);
			vector.values.push(count as f32 * self.idf[col as usize]);
		}
		let norm = vector.values.iter().map(|v| v * v).sum::<f32>().sqrt();
		if norm > 0.0 {
			for v in &mut vector.values {
				*v /= norm;
			}
		}
		vector
	}

	pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> TermMatrix {
		let mut matrix = TermMatrix::empty(self.vocabulary_len());
		for doc in docs {
			matrix.push_row(self.project(doc.as_ref()));
		}
		matrix
	}

	pub fn to_json(&self) -> Result<String> {
		let state = VectorizerState {
			analyzer: self.analyzer.config(),
			terms: self.terms.clone(),
			idf: self.idf.clone(),
		};
		Ok(serde_json::to_string(&state)?)
	}

	pub fn from_json(json: &str) -> Result<Self> {
		let state: VectorizerState = serde_json::from_str(json)?;
		if state.terms.len() != state.idf.len() {
			return Err(Error::DimensionMismatch {
				expected: state.terms.len(),
				got: state.idf.len(),
			}
			.into());
		}
		Ok(Self::from_parts(Analyzer::new(state.analyzer), state.terms, state.idf))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn idf_matches_smoothed_formula() {
		let docs = ["red chair", "blue chair", "red lamp"];
		let v = TfidfVectorizer::fit(AnalyzerConfig::default(), &docs);
		let expected_chair = ((4.0f64 / 3.0).ln() + 1.0) as f32;
		let expected_lamp = ((4.0f64 / 2.0).ln() + 1.0) as f32;
		assert_eq!(v.idf("chair"), Some(expected_chair));
		assert_eq!(v.idf("lamp"), Some(expected_lamp));
		assert_eq!(v.column("blue"), Some(0), "columns follow sorted term order");
	}

	#[test]
	fn projected_rows_are_unit_length() {
		let docs = ["red chair red", "blue lamp"];
		let (_, m) = TfidfVectorizer::fit_transform(AnalyzerConfig::default(), &docs);
		for i in 0..m.rows() {
			let (_, values) = m.row(i);
			let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
			assert!((norm - 1.0).abs() < 1e-6);
		}
	}
}
