pub mod groq;
pub mod openrouter;
pub(crate) mod sse;

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use paperchat_core::config::ProviderConfig;
use paperchat_core::ChatTurn;

pub use groq::GroqProvider;
pub use openrouter::OpenRouterProvider;

use crate::provider::ChatProvider;

pub(crate) fn turns_json(turns: &[ChatTurn]) -> Vec<Value> {
    turns
        .iter()
        .map(|t| json!({"role": t.role.as_str(), "content": t.content}))
        .collect()
}

/// Configured providers in fallback order: OpenRouter, then Groq.
/// Providers without an API key are left out.
pub fn create_providers(config: &ProviderConfig) -> Vec<Arc<dyn ChatProvider>> {
    let client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to build provider HTTP client; using defaults");
            reqwest::Client::new()
        });

    let mut providers: Vec<Arc<dyn ChatProvider>> = Vec::new();
    if let Some(key) = &config.openrouter_api_key {
        providers.push(Arc::new(OpenRouterProvider::new(
            client.clone(),
            key.clone(),
            config.openrouter_model.clone(),
            config.openrouter_base_url.clone(),
            config.idle_timeout(),
        )));
    }
    if let Some(key) = &config.groq_api_key {
        providers.push(Arc::new(GroqProvider::new(
            client,
            key.clone(),
            config.groq_model.clone(),
            config.groq_base_url.clone(),
            config.idle_timeout(),
        )));
    }

    let names: Vec<&str> = providers.iter().map(|p| p.provider_name()).collect();
    info!(providers = ?names, "completion providers configured");
    providers
}
