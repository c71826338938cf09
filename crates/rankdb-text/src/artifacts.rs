use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use rankdb_core::Error;

use crate::analyzer::AnalyzerConfig;
use crate::tfidf::{TermMatrix, TfidfVectorizer};

pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
pub const MATRIX_FILE: &str = "tfidf_matrix.json";

/// The fitted vectorizer and the matrix it produced, persisted side by side.
#[derive(Debug, Clone)]
pub struct LexicalArtifacts {
	pub vectorizer: TfidfVectorizer,
	pub matrix: TermMatrix,
}

impl LexicalArtifacts {
	pub fn fit<S: AsRef<str>>(config: AnalyzerConfig, docs: &[S]) -> Self {
		let (vectorizer, matrix) = TfidfVectorizer::fit_transform(config, docs);
		Self { vectorizer, matrix }
	}

	/// Each file is written next to its final name and renamed into place.
	pub fn save(&self, dir: &Path) -> Result<()> {
		fs::create_dir_all(dir)?;
		let vectorizer_tmp = staged(dir, VECTORIZER_FILE);
		fs::write(&vectorizer_tmp, self.vectorizer.to_json()?)
			.with_context(|| format!("writing {}", vectorizer_tmp.display()))?;

		let matrix_tmp = staged(dir, MATRIX_FILE);
		let mut writer = BufWriter::new(fs::File::create(&matrix_tmp)?);
		serde_json::to_writer(&mut writer, &self.matrix)?;
		writer.flush()?;
		drop(writer);

		fs::rename(&matrix_tmp, dir.join(MATRIX_FILE))?;
		fs::rename(&vectorizer_tmp, dir.join(VECTORIZER_FILE))?;
		info!(
			dir = %dir.display(),
			rows = self.matrix.rows(),
			terms = self.matrix.n_cols(),
			nnz = self.matrix.nnz(),
			"saved lexical artifacts"
		);
		Ok(())
	}

	pub fn load(dir: &Path) -> Result<Self> {
		let vectorizer_path = dir.join(VECTORIZER_FILE);
		let json = fs::read_to_string(&vectorizer_path)
			.with_context(|| format!("reading {}", vectorizer_path.display()))?;
		let vectorizer = TfidfVectorizer::from_json(&json)?;

		let matrix_path = dir.join(MATRIX_FILE);
		let file = fs::File::open(&matrix_path)
			.with_context(|| format!("reading {}", matrix_path.display()))?;
		let matrix: TermMatrix = serde_json::from_reader(BufReader::new(file))?;
		matrix.validate()?;
		if matrix.n_cols() != vectorizer.vocabulary_len() {
			return Err(Error::DimensionMismatch {
				expected: vectorizer.vocabulary_len(),
				got: matrix.n_cols(),
			}
			.into());
		}
		Ok(Self { vectorizer, matrix })
	}

	pub fn exists(dir: &Path) -> bool {
		dir.join(VECTORIZER_FILE).is_file() && dir.join(MATRIX_FILE).is_file()
	}
}

fn staged(dir: &Path, file: &str) -> PathBuf {
	dir.join(format!("{file}.tmp"))
}
