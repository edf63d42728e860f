//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin = %origin, "invalid CORS_ORIGIN; allowing any origin");
            CorsLayer::permissive()
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/resolve-pdf", post(api::resolve_pdf))
        .route("/process-pdf", post(api::process_pdf))
        .route("/chat-with-ai", post(api::chat_with_ai))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
