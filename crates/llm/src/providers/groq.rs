use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use paperchat_core::ChatTurn;

use super::{sse, turns_json};
use crate::provider::{ChatProvider, DecodingParams, LlmError, TokenStream};

/// Groq's OpenAI-compatible endpoint. Output length is `max_completion_tokens`.
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    idle_timeout: Duration,
}

impl GroqProvider {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        model: String,
        base_url: String,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            idle_timeout,
        }
    }

    pub(crate) fn request_body(&self, turns: &[ChatTurn], params: &DecodingParams) -> Value {
        json!({
            "model": self.model,
            "messages": turns_json(turns),
            "temperature": params.temperature,
            "max_completion_tokens": params.max_tokens,
            "top_p": params.top_p,
            "stream": true,
            "stop": null,
        })
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    async fn stream_chat(
        &self,
        turns: &[ChatTurn],
        params: &DecodingParams,
    ) -> Result<TokenStream, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, url = %url, "starting Groq streaming request");

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(turns, params));
        sse::open_stream(request, self.provider_name(), self.idle_timeout).await
    }

    fn provider_name(&self) -> &str {
        "groq"
    }
}
