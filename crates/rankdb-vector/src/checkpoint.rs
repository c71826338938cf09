//! Intermediate embeddings written during an indexing run.
//!
//! Each provider batch becomes one append to a Lance table, so a crash
//! loses at most the batch in flight. Rows carry the content hash of the
//! text they were embedded from; a resumed run only trusts rows whose id and
//! hash still match the corpus.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use arrow_array::{RecordBatch, StringArray, UInt32Array};
use tracing::{debug, info};

use rankdb_core::{DocId, Error};

use crate::schema::{build_checkpoint_schema, CHECKPOINT_TABLE};
use crate::table::{
	append_batches, open_dir, scan_table, string_column, table_exists, u32_column, vector_array,
	vector_column,
};

pub fn content_hash(text: &str) -> String {
	blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRow {
	pub position: usize,
	pub id: DocId,
	pub content_hash: String,
	pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingCheckpoint {
	dir: PathBuf,
	dim: usize,
}

impl EmbeddingCheckpoint {
	pub fn new(dir: impl Into<PathBuf>, dim: usize) -> Self {
		Self { dir: dir.into(), dim }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn exists(&self) -> bool {
		self.dir.exists()
	}

	/// Persist one batch of embeddings starting at corpus position `start`.
	pub async fn append(
		&self,
		start: usize,
		ids: &[DocId],
		hashes: &[String],
		vectors: &[Vec<f32>],
	) -> Result<()> {
		if ids.len() != vectors.len() || hashes.len() != vectors.len() {
			return Err(Error::Operation("checkpoint batch columns differ in length".into()).into());
		}
		if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) {
			return Err(Error::DimensionMismatch { expected: self.dim, got: v.len() }.into());
		}
		let schema = build_checkpoint_schema(self.dim);
		let positions: Vec<u32> = (start..start + ids.len()).map(|p| p as u32).collect();
		let batch = RecordBatch::try_new(
			schema.clone(),
			vec![
				Arc::new(UInt32Array::from(positions)),
				Arc::new(StringArray::from(ids.to_vec())),
				Arc::new(StringArray::from(hashes.to_vec())),
				Arc::new(vector_array(vectors, self.dim)),
			],
		)?;
		fs::create_dir_all(&self.dir)?;
		let conn = open_dir(&self.dir).await?;
		append_batches(&conn, CHECKPOINT_TABLE, schema, vec![batch]).await?;
		debug!(start, rows = ids.len(), dir = %self.dir.display(), "checkpoint appended");
		Ok(())
	}

	/// All rows written so far, ordered by position. Empty when there is no checkpoint.
	pub async fn load(&self) -> Result<Vec<CheckpointRow>> {
		if !self.exists() {
			return Ok(Vec::new());
		}
		let conn = open_dir(&self.dir).await?;
		if !table_exists(&conn, CHECKPOINT_TABLE).await? {
			return Ok(Vec::new());
		}
		let mut rows = Vec::new();
		for batch in scan_table(&conn, CHECKPOINT_TABLE).await? {
			let positions = u32_column(&batch, "position")?;
			let ids = string_column(&batch, "id")?;
			let hashes = string_column(&batch, "content_hash")?;
			for (i, vector) in vector_column(&batch, "vector")?.into_iter().enumerate() {
				rows.push(CheckpointRow {
					position: positions.value(i) as usize,
					id: ids.value(i).to_string(),
					content_hash: hashes.value(i).to_string(),
					vector,
				});
			}
		}
		rows.sort_by_key(|r| r.position);
		Ok(rows)
	}

	pub fn remove(&self) -> Result<()> {
		if self.exists() {
			fs::remove_dir_all(&self.dir)?;
			info!(dir = %self.dir.display(), "checkpoint removed");
		}
		Ok(())
	}
}
