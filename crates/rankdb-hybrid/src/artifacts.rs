use std::path::{Path, PathBuf};

use rankdb_core::config::{resolve_with_base, ArtifactSettings};

/// Where one engine's artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `artifacts.dir`, expanded and resolved against `base`.
    pub fn from_settings(settings: &ArtifactSettings, base: &Path) -> Self {
        Self::new(resolve_with_base(base, &settings.dir))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Holds `tfidf_vectorizer.json` and `tfidf_matrix.json`.
    pub fn lexical_dir(&self) -> &Path {
        &self.root
    }

    pub fn vector_index_dir(&self) -> PathBuf {
        self.root.join("vector_index")
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.root.join("checkpoint")
    }
}
