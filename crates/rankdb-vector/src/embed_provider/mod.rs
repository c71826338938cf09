//! Embedding providers behind `rankdb_core::traits::EmbeddingProvider`.
//!
//! Local models run on the blocking pool (see `local.rs`); the Cohere client
//! talks to the hosted API. Providers must return vectors of `dim()` width
//! for a given `embedder_id`.

use std::sync::Arc;

use anyhow::{bail, Result};

use rankdb_core::config::DenseSettings;
use rankdb_core::traits::EmbeddingProvider;

pub mod cohere;
pub mod local;

pub use cohere::CohereEmbedder;
pub use local::LocalProvider;

/// Provider named by `dense.provider`: `hashing`, `local` or `cohere`.
pub fn build_provider(settings: &DenseSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "hashing" | "local" => {
            Ok(Arc::new(LocalProvider::load(&settings.provider, settings.output_dim)?))
        }
        "cohere" => Ok(Arc::new(CohereEmbedder::from_env(
            &settings.model,
            settings.output_dim,
            settings.max_tokens,
        )?)),
        other => bail!("unknown embedding provider '{other}'"),
    }
}
