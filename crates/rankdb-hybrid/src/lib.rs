//! rankdb-hybrid
//!
//! Ties the lexical and dense signals together: the score mixture, the
//! serving engine (retrieve, join, rerank) and the offline pipeline that
//! produces every artifact the engine loads.

pub mod artifacts;
pub mod engine;
pub mod mixture;
pub mod pipeline;

pub use artifacts::ArtifactLayout;
pub use engine::HybridEngine;
pub use mixture::{combine_scores, score_mixture};
pub use pipeline::{IndexingPipeline, IndexingReport};
