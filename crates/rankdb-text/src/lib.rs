//! rankdb-text
//!
//! Lexical side of the engine: a tantivy analyzer feeding a TF-IDF
//! vectorizer, the sparse document-term matrix it produces, and the cosine
//! scorer that serves queries against both.

pub mod analyzer;
pub mod artifacts;
pub mod scorer;
pub mod tfidf;

pub use artifacts::LexicalArtifacts;
pub use scorer::{LexicalScorer, SimilarityMethod};
pub use tfidf::{SparseVector, TermMatrix, TfidfVectorizer};
