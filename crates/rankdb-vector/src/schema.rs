use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const INDEX_TABLE: &str = "vectors";
pub const CHECKPOINT_TABLE: &str = "embeddings";

fn vector_field(dim: usize) -> Field {
	let item = Arc::new(Field::new("item", DataType::Float32, true));
	Field::new("vector", DataType::FixedSizeList(item, dim as i32), true)
}

/// Frozen dense index: one row per corpus position.
pub fn build_index_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("position", DataType::UInt32, false),
		Field::new("id", DataType::Utf8, false),
		vector_field(dim),
	]))
}

/// Embeddings accumulated by an indexing run, appended one batch at a time.
pub fn build_checkpoint_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("position", DataType::UInt32, false),
		Field::new("id", DataType::Utf8, false),
		Field::new("content_hash", DataType::Utf8, false),
		vector_field(dim),
	]))
}
