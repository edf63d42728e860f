use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{validate_batch, Embedder, EmbeddingError};
use super::{http_client, send};

/// Local Ollama instance, `POST {url}/api/embed`.
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: &str, model: String, dimensions: usize, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            endpoint: format!("{}/api/embed", url.trim_end_matches('/')),
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
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            input: texts,
        });
        let EmbedResponse { embeddings } = send(request).await?.json().await?;
        validate_batch(&embeddings, texts.len(), self.dimensions)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
