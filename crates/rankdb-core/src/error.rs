use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Similarity method '{0}' is not supported for lexical scoring. Must be cosine")]
    InvalidSimilarityMethod(String),

    #[error("Missing columns in corpus: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Corpus is empty")]
    EmptyCorpus,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Score vectors are not aligned: lexical has {lexical} positions, dense has {dense}")]
    MisalignedScores { lexical: usize, dense: usize },

    #[error("Mixture weight must lie in [0, 1], got {0}")]
    InvalidMixtureWeight(f32),

    #[error("Embedding has zero norm and cannot be normalized")]
    DegenerateEmbedding,

    #[error("Provider error: {0}")]
    Provider(String),
}

pub type Result<T> = std::result::Result<T, Error>;
