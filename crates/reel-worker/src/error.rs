//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Executor is shutting down")]
    ShuttingDown,

    #[error("Segmentation failed: {0}")]
    SegmentationFailed(String),

    #[error("AI prompt authoring failed: {0}")]
    AiFailed(String),

    #[error("Render request failed: {0}")]
    RenderFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Job record error: {0}")]
    Record(#[from] reel_models::ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Segmenter error: {0}")]
    Nlp(#[from] reel_nlp::NlpError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn segmentation_failed(msg: impl Into<String>) -> Self {
        Self::SegmentationFailed(msg.into())
    }

    pub fn ai_failed(msg: impl Into<String>) -> Self {
        Self::AiFailed(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::SigningFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::AiFailed(_) | WorkerError::RenderFailed(_) | WorkerError::Storage(_) => {
                true
            }
            WorkerError::Nlp(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if the error means the service cannot run jobs at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, WorkerError::ConfigError(_) | WorkerError::ShuttingDown)
    }
}
