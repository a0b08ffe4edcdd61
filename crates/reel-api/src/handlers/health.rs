//! Health check handler.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    /// Whether `POST /generate` currently accepts jobs
    pub generation_ready: bool,
    /// Required collaborators that are not configured
    pub missing: Vec<String>,
    /// `service` or `fallback`
    pub segmentation: String,
    pub mock_mode: bool,
}

/// Health check endpoint (liveness probe).
///
/// Always 200 while the process is up; readiness for generation is reported
/// in the body.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let executor = &state.executor;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        generation_ready: executor.is_ready(),
        missing: executor
            .missing_collaborators()
            .iter()
            .map(|m| m.to_string())
            .collect(),
        segmentation: if executor.uses_fallback_segmentation() {
            "fallback".to_string()
        } else {
            "service".to_string()
        },
        mock_mode: state.config.mock_mode,
    })
}
