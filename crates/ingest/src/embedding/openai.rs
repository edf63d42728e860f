use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{validate_batch, Embedder, EmbeddingError};
use super::{http_client, send};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible `POST {base}/v1/embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<&str>,
        dimensions: usize,
        timeout: Duration,
    ) -> Self {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        Self {
            client: http_client(timeout),
            api_key,
            endpoint: format!("{base}/v1/embeddings"),
            model,
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

/// Vectors in input order; the API may return items out of order.
fn into_input_order(mut items: Vec<EmbedItem>) -> Vec<Vec<f32>> {
    items.sort_by_key(|item| item.index);
    items.into_iter().map(|item| item.embedding).collect()
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            });
        let response: EmbedResponse = send(request).await?.json().await?;

        let embeddings = into_input_order(response.data);
        validate_batch(&embeddings, texts.len(), self.dimensions)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    fn embedder(base: &str, dimensions: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::new("sk-test".into(), "text-embedding-3-small".into(), Some(base), dimensions, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn reorders_items_by_index() {
        let body = br#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#.to_vec();
        let base = serve_once("200 OK", "application/json", body).await;

        let vectors = embedder(&base, 1).embed_batch(&["first", "second"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn short_batch_is_a_count_mismatch() {
        let body = br#"{"data":[{"index":0,"embedding":[1.0]}]}"#.to_vec();
        let base = serve_once("200 OK", "application/json", body).await;

        let err = embedder(&base, 1).embed_batch(&["a", "b"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::CountMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn rejected_key_is_an_api_error() {
        let base = serve_once("401 Unauthorized", "application/json", br#"{"error":"bad key"}"#.to_vec()).await;

        let err = embedder(&base, 1).embed_batch(&["a"]).await.unwrap_err();
        assert!(matches!(&err, EmbeddingError::Api(m) if m.starts_with("401")));
    }
}
