//! LanceDB connection and housekeeping helpers.
//!
//! Open a database, create-or-append record batches, scan a whole table and
//! pull typed columns back out of the scanned batches.
use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{
	Array, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, UInt32Array,
};
use lancedb::query::ExecutableQuery;
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
	Ok(connect(uri).execute().await?)
}

pub async fn open_dir(dir: &Path) -> Result<Connection> {
	open_db(dir.to_string_lossy().as_ref()).await
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
	Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Append `batches` to `name`, creating the table on first write.
pub async fn append_batches(
	conn: &Connection,
	name: &str,
	schema: Arc<arrow_schema::Schema>,
	batches: Vec<RecordBatch>,
) -> Result<()> {
	let reader = Box::new(RecordBatchIterator::new(batches.into_iter().map(Ok), schema.clone()));
	if table_exists(conn, name).await? {
		conn.open_table(name).execute().await?.add(reader).execute().await?;
	} else {
		conn.create_table(name, reader).execute().await?;
	}
	Ok(())
}

pub async fn scan_table(conn: &Connection, name: &str) -> Result<Vec<RecordBatch>> {
	let table = conn.open_table(name).execute().await?;
	let mut stream = table.query().execute().await?;
	let mut batches = Vec::new();
	while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
		if batch.num_rows() > 0 {
			batches.push(batch);
		}
	}
	Ok(batches)
}

pub fn vector_array(vectors: &[Vec<f32>], dim: usize) -> FixedSizeListArray {
	let rows: Vec<Option<Vec<Option<f32>>>> =
		vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
	FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(rows.into_iter(), dim as i32)
}

pub fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("missing {name} column"))
}

pub fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
		.ok_or_else(|| anyhow!("missing {name} column"))
}

pub fn vector_column(batch: &RecordBatch, name: &str) -> Result<Vec<Vec<f32>>> {
	let list = batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
		.ok_or_else(|| anyhow!("missing {name} column"))?;
	let mut out = Vec::with_capacity(list.len());
	for i in 0..list.len() {
		let row = list.value(i);
		out.push(row.as_primitive::<Float32Type>().values().to_vec());
	}
	Ok(out)
}
