//! rankdb-rerank
//!
//! Second-pass relevance scoring over a bounded candidate set. The stage
//! builds candidate texts and validates what the provider sends back; the
//! providers are the hosted Cohere reranker and a local term-overlap scorer.

use std::sync::Arc;

use anyhow::{bail, Result};

use rankdb_core::config::RerankSettings;
use rankdb_core::traits::RerankProvider;

pub mod cohere;
pub mod overlap;
pub mod stage;

pub use cohere::CohereReranker;
pub use overlap::TermOverlapReranker;
pub use stage::RerankStage;

/// Reranker named by `rerank.provider`: `overlap` or `cohere`.
pub fn build_reranker(settings: &RerankSettings) -> Result<Arc<dyn RerankProvider>> {
    match settings.provider.as_str() {
        "overlap" => Ok(Arc::new(TermOverlapReranker)),
        "cohere" => Ok(Arc::new(CohereReranker::from_env(&settings.model)?)),
        other => bail!("unknown rerank provider '{other}'"),
    }
}
