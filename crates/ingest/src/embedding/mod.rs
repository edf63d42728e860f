pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

use paperchat_core::config::EmbeddingConfig;
use reqwest::{Client, RequestBuilder, Response};
use tracing::warn;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError};

/// Create the configured embedding backend, or `None` when embedding is
/// disabled or misconfigured (chat then runs ungrounded).
pub fn create_embedder(config: &EmbeddingConfig) -> Option<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" => Some(Arc::new(OllamaEmbedder::new(
            &config.ollama_url,
            config.model.clone(),
            config.dimensions,
            config.timeout(),
        ))),
        "openai" => match &config.openai_api_key {
            Some(key) => Some(Arc::new(OpenAiEmbedder::new(
                key.clone(),
                config.model.clone(),
                config.openai_base_url.as_deref(),
                config.dimensions,
                config.timeout(),
            ))),
            None => {
                warn!("EMBEDDING_PROVIDER=openai but OPENAI_API_KEY not set; embedding disabled");
                None
            }
        },
        "none" | "" => None,
        other => {
            warn!("unknown embedding provider '{}'; embedding disabled", other);
            None
        }
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send an embedding request. Non-success statuses become `EmbeddingError::Api`
/// carrying the status and body.
async fn send(request: RequestBuilder) -> Result<Response, EmbeddingError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EmbeddingError::Api(format!("{status}: {body}")))
}
