use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use paperchat_ingest::ProcessedDocument;

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProcessRequest {
    pub pdf_url: String,
    #[serde(default = "default_ignore_pages")]
    pub ignore_pages: String,
}

fn default_ignore_pages() -> String {
    "none".to_string()
}

#[derive(Serialize)]
pub struct ProcessResponse {
    #[serde(flatten)]
    pub document: ProcessedDocument,
    pub status: &'static str,
}

pub async fn process_pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ErrorResponse>)> {
    let documents = state.documents.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Embedding model not available")),
    ))?;

    match documents.process(&req.pdf_url, &req.ignore_pages).await {
        Ok(document) => {
            info!(
                url = %req.pdf_url,
                chunks = document.chunks_created,
                cached = !document.newly_processed,
                "process-pdf complete"
            );
            Ok(Json(ProcessResponse {
                document,
                status: "success",
            }))
        }
        Err(e) => {
            warn!(url = %req.pdf_url, error = %e, "process-pdf failed");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
