use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;

use paperchat_llm::{ChatFailure, ChatRequest};

use super::ErrorResponse;
use crate::state::AppState;

/// Stream a plain-text answer. The first chunk names the context mode.
pub async fn chat_with_ai(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    match state.chat.chat(&req).await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            Body::from_stream(stream.map(Ok::<_, Infallible>)),
        )
            .into_response(),
        Err(failure) => {
            let status = match failure {
                ChatFailure::Configuration => StatusCode::SERVICE_UNAVAILABLE,
                ChatFailure::Provider { .. } | ChatFailure::AllFailed { .. } => StatusCode::BAD_GATEWAY,
            };
            let body = ErrorResponse::new(failure.to_string()).with_details(failure.details());
            (status, Json(body)).into_response()
        }
    }
}
