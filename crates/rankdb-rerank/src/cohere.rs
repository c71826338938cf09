use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rankdb_core::cohere::CohereClient;
use rankdb_core::traits::RerankProvider;
use rankdb_core::ScoredPosition;

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

impl From<RerankResponse> for Vec<ScoredPosition> {
    fn from(response: RerankResponse) -> Self {
        response
            .results
            .into_iter()
            .map(|r| ScoredPosition::new(r.index, r.relevance_score))
            .collect()
    }
}

/// Hosted cross-encoder via `POST /v2/rerank`.
#[derive(Debug, Clone)]
pub struct CohereReranker {
    client: CohereClient,
    model: String,
}

impl CohereReranker {
    pub fn new(client: CohereClient, model: &str) -> Self {
        Self { client, model: model.to_string() }
    }

    pub fn from_env(model: &str) -> Result<Self> {
        Ok(Self::new(CohereClient::from_env()?, model))
    }
}

#[async_trait]
impl RerankProvider for CohereReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<ScoredPosition>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let request = RerankRequest { model: &self.model, query, documents, top_n };
        let response: RerankResponse = self.client.post("/v2/rerank", &request).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_maps_to_positions() {
        let body = r#"{"id":"r1","results":[
            {"index":2,"relevance_score":0.91},
            {"index":0,"relevance_score":0.12}
        ],"meta":{}}"#;
        let parsed: RerankResponse = serde_json::from_str(body).unwrap();
        let ranked: Vec<ScoredPosition> = parsed.into();
        assert_eq!(ranked, vec![ScoredPosition::new(2, 0.91), ScoredPosition::new(0, 0.12)]);
    }

    #[test]
    fn request_carries_top_n() {
        let docs = vec!["a".to_string(), "b".to_string()];
        let request =
            RerankRequest { model: "rerank-v3.5", query: "q", documents: &docs, top_n: 1 };
        let json = serde_json::to_value(request).unwrap();
        assert_eq!(json["top_n"], 1);
        assert_eq!(json["documents"][1], "b");
    }
}
