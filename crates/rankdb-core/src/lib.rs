//! rankdb-core
//!
//! Shared vocabulary for the retrieval engine: documents and scored
//! positions, the error taxonomy, provider traits, configuration and the
//! retry/fallback wrapper used around every external call.

pub mod catalog;
pub mod cohere;
pub mod config;
pub mod error;
pub mod resilience;
pub mod text;
pub mod traits;
pub mod types;

pub use error::Error;
pub use types::{Document, DocId, EmbedPurpose, ScoredPosition, SearchHit, SourceKind};
