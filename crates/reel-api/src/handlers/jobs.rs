//! Job submission and status handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use reel_models::{Job, JobId, JobStatus, VideoRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response to an accepted submission.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Job status snapshot as seen by clients.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: String,
    /// Present exactly when `status` is `COMPLETED`
    pub video_url: Option<String>,
    pub request: VideoRequest,
    pub clips_total: usize,
    pub clips_succeeded: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status,
            progress: job.progress.clone(),
            video_url: job.video_url.clone(),
            request: job.request.clone(),
            clips_total: job.outcomes.len(),
            clips_succeeded: job.successful_urls().len(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Submit a script for video generation.
///
/// POST /generate
pub async fn generate_video(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    let job = state.executor.submit(request).await?;
    info!(job_id = %job.id, "Queued video generation job");

    Ok(Json(GenerateResponse {
        job_id: job.id.to_string(),
        status: job.status,
    }))
}

/// Get the current status of a job.
///
/// GET /status/:job_id
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state.executor.status(&JobId::from_string(job_id)).await?;
    Ok(Json(JobStatusResponse::from(job.as_ref())))
}
