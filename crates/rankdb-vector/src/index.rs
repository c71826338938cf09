//! Exact inner-product index over unit vectors.
//!
//! Vectors live in one flat, position-ordered buffer with ids kept in
//! lockstep. Persisted as a Lance table plus a JSON manifest; a save builds
//! the new directory beside the old one and swaps it in.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{RecordBatch, StringArray, UInt32Array};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rankdb_core::types::top_positions;
use rankdb_core::{DocId, Error, ScoredPosition};

use crate::schema::{build_index_schema, INDEX_TABLE};
use crate::table::{
    append_batches, open_dir, scan_table, string_column, u32_column, vector_array, vector_column,
};

pub const MANIFEST_FILE: &str = "manifest.json";
const ROWS_PER_BATCH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub dim: usize,
    pub count: usize,
    pub embedder_id: String,
    pub built_at: String,
}

/// Scale `v` to unit length in place. Zero vectors stay zero.
pub fn l2_normalize(v: &mut [f32]) -> f32 {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseIndex {
    dim: usize,
    ids: Vec<DocId>,
    vectors: Vec<f32>,
}

impl DenseIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, ids: Vec::new(), vectors: Vec::new() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id_at(&self, position: usize) -> Option<&str> {
        self.ids.get(position).map(String::as_str)
    }

    pub fn ids(&self) -> &[DocId] {
        &self.ids
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.vectors.get(start..start + self.dim)
    }

    /// Append one document at the next position, normalizing its vector.
    /// A zero vector is kept as is and scores 0 against every query.
    pub fn add(&mut self, id: impl Into<DocId>, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: vector.len() }.into());
        }
        let id = id.into();
        let start = self.vectors.len();
        self.vectors.extend_from_slice(vector);
        if l2_normalize(&mut self.vectors[start..]) == 0.0 {
            warn!(id = %id, position = self.ids.len(), "zero-norm document embedding");
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn add_batch(&mut self, ids: &[DocId], vectors: &[Vec<f32>]) -> Result<()> {
        if ids.len() != vectors.len() {
            let msg = format!("{} ids for {} vectors", ids.len(), vectors.len());
            return Err(Error::Operation(msg).into());
        }
        for (id, v) in ids.iter().zip(vectors) {
            self.add(id.clone(), v)?;
        }
        Ok(())
    }

    /// Inner product of `query` with every stored vector, in position order.
    pub fn inner_products(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: query.len() }.into());
        }
        if self.dim == 0 {
            return Ok(vec![0.0; self.len()]);
        }
        Ok(self
            .vectors
            .chunks_exact(self.dim)
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum())
            .collect())
    }

    /// Exact top-`k` by inner product, best first, ties to the lower position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPosition>> {
        let scores = self.inner_products(query)?;
        Ok(top_positions(&scores, k))
    }

    fn to_batches(&self) -> Result<Vec<RecordBatch>> {
        let schema = build_index_schema(self.dim);
        let mut batches = Vec::new();
        for start in (0..self.len()).step_by(ROWS_PER_BATCH) {
            let end = (start + ROWS_PER_BATCH).min(self.len());
            let positions: Vec<u32> = (start..end).map(|p| p as u32).collect();
            let vectors: Vec<Vec<f32>> =
                (start..end).filter_map(|p| self.vector(p).map(<[f32]>::to_vec)).collect();
            batches.push(RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(UInt32Array::from(positions)),
                    Arc::new(StringArray::from(self.ids[start..end].to_vec())),
                    Arc::new(vector_array(&vectors, self.dim)),
                ],
            )?);
        }
        Ok(batches)
    }

    /// Write to `dir`, replacing whatever index was there.
    pub async fn save(&self, dir: &Path, embedder_id: &str) -> Result<IndexManifest> {
        let staging = sibling(dir, "staging");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let conn = open_dir(&staging).await?;
        append_batches(&conn, INDEX_TABLE, build_index_schema(self.dim), self.to_batches()?).await?;
        let manifest = IndexManifest {
            dim: self.dim,
            count: self.len(),
            embedder_id: embedder_id.to_string(),
            built_at: Utc::now().to_rfc3339(),
        };
        fs::write(staging.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;

        let retired = sibling(dir, "old");
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        if dir.exists() {
            fs::rename(dir, &retired).with_context(|| format!("retiring {}", dir.display()))?;
        }
        fs::rename(&staging, dir).with_context(|| format!("installing {}", dir.display()))?;
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        info!(
            dir = %dir.display(),
            count = manifest.count,
            dim = manifest.dim,
            "saved dense index"
        );
        Ok(manifest)
    }

    pub async fn load(dir: &Path) -> Result<(Self, IndexManifest)> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest: IndexManifest = serde_json::from_slice(
            &fs::read(&manifest_path)
                .with_context(|| format!("reading {}", manifest_path.display()))?,
        )?;

        let mut index = Self::new(manifest.dim);
        let conn = open_dir(dir).await?;
        let mut rows: Vec<(u32, String, Vec<f32>)> = Vec::with_capacity(manifest.count);
        for batch in scan_table(&conn, INDEX_TABLE).await? {
            let positions = u32_column(&batch, "position")?;
            let ids = string_column(&batch, "id")?;
            let vectors = vector_column(&batch, "vector")?;
            for (i, v) in vectors.into_iter().enumerate() {
                rows.push((positions.value(i), ids.value(i).to_string(), v));
            }
        }
        rows.sort_by_key(|(p, _, _)| *p);

        for (expected, (position, id, vector)) in rows.into_iter().enumerate() {
            if position as usize != expected {
                let msg = format!("vector index has a gap at position {expected}");
                return Err(Error::Operation(msg).into());
            }
            if vector.len() != index.dim {
                return Err(
                    Error::DimensionMismatch { expected: index.dim, got: vector.len() }.into()
                );
            }
            // Stored vectors are already unit length; keep their exact bits.
            index.vectors.extend_from_slice(&vector);
            index.ids.push(id);
        }
        if index.len() != manifest.count {
            let msg =
                format!("manifest lists {} vectors, table holds {}", manifest.count, index.len());
            return Err(Error::Operation(msg).into());
        }
        debug!(dir = %dir.display(), count = index.len(), "loaded dense index");
        Ok((index, manifest))
    }
}

fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!("{name}.{suffix}"))
}
