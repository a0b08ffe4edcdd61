//! NLP client error types.

use thiserror::Error;

pub type NlpResult<T> = Result<T, NlpError>;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("Segmenter not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Segmenter returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid segmenter response: {0}")]
    InvalidResponse(String),
}

impl NlpError {
    /// Transport-level and 5xx failures may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            NlpError::Request(e) => e.is_timeout() || e.is_connect(),
            NlpError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
