use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rankdb_core::cohere::CohereClient;
use rankdb_core::traits::EmbeddingProvider;
use rankdb_core::{EmbedPurpose, Error};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'static str,
    embedding_types: [&'static str; 1],
    output_dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: EmbeddingsByType,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsByType {
    #[serde(default)]
    float: Vec<Vec<f32>>,
}

fn input_type(purpose: EmbedPurpose) -> &'static str {
    match purpose {
        EmbedPurpose::Query => "search_query",
        EmbedPurpose::Document => "search_document",
    }
}

/// Hosted embeddings via `POST /v2/embed`.
#[derive(Debug, Clone)]
pub struct CohereEmbedder {
    client: CohereClient,
    model: String,
    dim: usize,
    max_tokens: usize,
    id: String,
}

impl CohereEmbedder {
    pub fn new(client: CohereClient, model: &str, dim: usize, max_tokens: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            dim,
            max_tokens,
            id: format!("cohere:{model}:d{dim}"),
        }
    }

    pub fn from_env(model: &str, dim: usize, max_tokens: usize) -> Result<Self> {
        Ok(Self::new(CohereClient::from_env()?, model, dim, max_tokens))
    }
}

#[async_trait]
impl EmbeddingProvider for CohereEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_tokens
    }

    async fn embed(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbedRequest {
            model: &self.model,
            texts,
            input_type: input_type(purpose),
            embedding_types: ["float"],
            output_dimension: self.dim,
        };
        let response: EmbedResponse = self.client.post("/v2/embed", &request).await?;
        let vectors = response.embeddings.float;
        if vectors.len() != texts.len() {
            let msg = format!("asked for {} embeddings, got {}", texts.len(), vectors.len());
            return Err(Error::Provider(msg).into());
        }
        Ok(vectors)
    }
}
