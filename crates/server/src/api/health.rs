use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Research paper chat API is running" }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub embedding_ready: bool,
    pub providers: Vec<String>,
    pub cached_documents: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        embedding_ready: state.documents.is_some(),
        providers: state
            .chat
            .provider_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        cached_documents: state
            .documents
            .as_ref()
            .map(|d| d.cache().len())
            .unwrap_or(0),
    })
}
