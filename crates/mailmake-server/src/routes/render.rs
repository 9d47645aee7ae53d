//! Stateless preview rendering

use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;

use crate::{
    AppState,
    error::{ApiError, Result},
    models::{ApiResponse, PreviewRequest, RenderPreview},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(render_preview))
}

/// Render markup without touching any stored template
///
/// Invalid markup is not a request error: the diagnostic is returned in
/// place of the HTML.
pub async fn render_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<ApiResponse<RenderPreview>>> {
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.render(&request.content))
        .await
        .map_err(|e| ApiError::internal(format!("Render task failed: {}", e)))?;

    debug!(ok = result.is_ok(), "rendered preview");
    Ok(Json(ApiResponse::new(RenderPreview::from(&result))))
}
