//! Minimal JSON-over-HTTP client for the Cohere v2 API.
//!
//! One pooled `reqwest::Client` per process; every call is a single POST
//! with bearer auth. Non-2xx responses become `Error::Provider` carrying the
//! status and body so the resilience wrapper logs something useful.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.cohere.com";
pub const API_KEY_VAR: &str = "COHERE_API_KEY";

fn http_client() -> Result<reqwest::Client> {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client.clone());
    }
    let client = reqwest::Client::builder()
        .user_agent(concat!("rankdb/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .build()
        .context("building HTTP client")?;
    Ok(CLIENT.get_or_init(|| client).clone())
}

#[derive(Clone)]
pub struct CohereClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CohereClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Reads the key from `COHERE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_VAR)
            .map_err(|_| Error::InvalidConfig(format!("{API_KEY_VAR} is not set")))?;
        Self::new(key)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "cohere request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("POST {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("POST {url} returned {status}: {text}")).into());
        }
        let parsed = response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Provider(format!("decoding response from {url}: {e}")))?;
        Ok(parsed)
    }
}

impl std::fmt::Debug for CohereClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CohereClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}
