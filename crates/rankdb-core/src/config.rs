//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SCORER__LEXICAL_ALPHA=0.3`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = current_env();

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Build from an inline TOML document only; no files, no environment.
    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::new().merge(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// `RUST_ENV`, defaulting to `dev`.
pub fn current_env() -> String {
    env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub artifacts: ArtifactSettings,
    pub catalog: CatalogSettings,
    pub lexical: LexicalSettings,
    pub dense: DenseSettings,
    pub scorer: ScorerSettings,
    pub fields: FieldSettings,
    pub rerank: RerankSettings,
    pub resilience: ResilienceSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let alpha = self.scorer.lexical_alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::InvalidConfig(format!(
                "scorer.lexical_alpha must lie in [0, 1], got {alpha}"
            )));
        }
        if self.dense.max_batch == 0 {
            return Err(Error::InvalidConfig("dense.max_batch must be at least 1".into()));
        }
        if self.dense.output_dim == 0 {
            return Err(Error::InvalidConfig("dense.output_dim must be at least 1".into()));
        }
        if self.fields.embed.is_empty() {
            return Err(Error::InvalidConfig("fields.embed must name at least one field".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub dir: String,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self { dir: "artifacts".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub path: String,
    pub id_column: String,
    pub delimiter: char,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self { path: "data/products.tsv".into(), id_column: "product_id".into(), delimiter: '\t' }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalSettings {
    pub similarity: String,
    pub stop_words: bool,
    pub min_token_chars: usize,
}

impl Default for LexicalSettings {
    fn default() -> Self {
        Self { similarity: "cosine".into(), stop_words: false, min_token_chars: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSettings {
    /// `hashing`, `local` or `cohere`.
    pub provider: String,
    pub model: String,
    pub output_dim: usize,
    pub max_tokens: usize,
    pub max_batch: usize,
}

impl Default for DenseSettings {
    fn default() -> Self {
        Self {
            provider: "hashing".into(),
            model: "embed-v4.0".into(),
            output_dim: 1024,
            max_tokens: 512,
            max_batch: 96,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerSettings {
    pub lexical_alpha: f32,
    pub top_n: usize,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self { lexical_alpha: 0.5, top_n: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub embed: Vec<String>,
    pub rerank: Vec<String>,
}

impl Default for FieldSettings {
    fn default() -> Self {
        let fields = vec!["product_name".to_string(), "product_description".to_string()];
        Self { embed: fields.clone(), rerank: fields }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSettings {
    /// `overlap` or `cohere`.
    pub provider: String,
    pub model: String,
    pub top_n: usize,
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self { provider: "overlap".into(), model: "rerank-v3.5".into(), top_n: 5 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retries: u32,
    pub delay_ms: u64,
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { retries: 2, delay_ms: 200 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    pub retrieve: RetrySettings,
    pub rerank: RetrySettings,
    pub pipeline: RetrySettings,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
