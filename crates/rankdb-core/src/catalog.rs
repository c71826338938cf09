//! Delimited-file catalog source.
//!
//! The catalog is the external metadata store keyed by product id. Locally
//! it is a header-first TSV; in production this would be a database query.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::error::Error;
use crate::types::{Document, Fields};

/// Load every row of `path` as a [`Document`]. `id_column` becomes the
/// document id; all other columns become fields (empty cells are kept as
/// empty strings).
pub fn load_delimited(path: &Path, id_column: &str, delimiter: u8) -> Result<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("opening catalog {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let id_idx = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| Error::MissingColumns(vec![id_column.to_string()]))?;

    let mut docs = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading catalog row {}", row + 1))?;
        let mut fields = Fields::new();
        for (col, value) in record.iter().enumerate() {
            if col == id_idx {
                continue;
            }
            if let Some(name) = headers.get(col) {
                fields.insert(name.to_string(), value.to_string());
            }
        }
        let id = record.get(id_idx).unwrap_or_default().to_string();
        docs.push(Document { id, fields });
    }
    info!(path = %path.display(), documents = docs.len(), "loaded catalog");
    Ok(docs)
}

/// Tab-separated catalog, the default export format.
pub fn load_tsv(path: &Path, id_column: &str) -> Result<Vec<Document>> {
    load_delimited(path, id_column, b'\t')
}
