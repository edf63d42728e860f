use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use paperchat_ingest::ResolvedLink;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub url: String,
}

/// Resolution always succeeds; unresolvable input is echoed back with an
/// `ORIGINAL_URL` source.
pub async fn resolve_pdf(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Json<ResolvedLink> {
    Json(state.resolver.resolve(&req.url).await)
}
