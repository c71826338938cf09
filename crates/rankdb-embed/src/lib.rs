//! rankdb-embed
//!
//! Local embedding models behind the synchronous `Embedder` trait.

use anyhow::{bail, Result};

use rankdb_core::traits::Embedder;

pub mod device;
pub mod hashing;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use model::BgeM3Embedder;
pub use pool::masked_mean_l2;

/// Build a local embedder by name: `hashing` (of width `dim`) or `local` (BGE-M3).
pub fn load_embedder(kind: &str, dim: usize) -> Result<Box<dyn Embedder>> {
    match kind {
        "hashing" => Ok(Box::new(HashingEmbedder::new(dim))),
        "local" => Ok(Box::new(BgeM3Embedder::from_env()?)),
        other => bail!("unknown local embedder '{other}'"),
    }
}
