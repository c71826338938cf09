//! rankdb-vector
//!
//! Dense side of the engine: the exact inner-product index and its Lance
//! persistence, the per-batch embedding checkpoint, the dense scorer and the
//! embedding providers it queries.

pub mod checkpoint;
pub mod dense;
pub mod embed_provider;
pub mod index;
pub mod schema;
pub mod table;

pub use checkpoint::{content_hash, CheckpointRow, EmbeddingCheckpoint};
pub use dense::DenseScorer;
pub use index::{DenseIndex, IndexManifest};
