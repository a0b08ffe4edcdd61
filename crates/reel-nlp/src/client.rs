//! HTTP client for `POST /segment`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NlpError, NlpResult};

/// Segmenter sidecar configuration.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Base URL of the sidecar, e.g. `http://localhost:8090`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl SegmenterConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Read `SEGMENTER_URL` / `SEGMENTER_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no sidecar is configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SEGMENTER_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let timeout = std::env::var("SEGMENTER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        Some(Self {
            base_url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[derive(Debug, Serialize)]
struct SegmentRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SegmentResponse {
    sentences: Vec<String>,
}

/// Sentence segmentation client.
#[derive(Clone)]
pub struct SentenceClient {
    client: Client,
    endpoint: String,
}

impl SentenceClient {
    /// Create a new client.
    pub fn new(config: SegmenterConfig) -> NlpResult<Self> {
        let base = config.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(NlpError::NotConfigured("empty base URL".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/segment", base),
        })
    }

    /// Create from environment variables, if a sidecar is configured.
    pub fn from_env() -> Option<NlpResult<Self>> {
        SegmenterConfig::from_env().map(Self::new)
    }

    /// Split `text` into sentences, in order.
    pub async fn segment(&self, text: &str) -> NlpResult<Vec<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SegmentRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NlpError::Api { status, body });
        }

        let parsed: SegmentResponse = response
            .json()
            .await
            .map_err(|e| NlpError::InvalidResponse(e.to_string()))?;

        let sentences: Vec<String> = parsed
            .sentences
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        debug!("Segmenter returned {} sentences", sentences.len());
        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalization() {
        let client = SentenceClient::new(SegmenterConfig::new("http://nlp:8090/")).unwrap();
        assert_eq!(client.endpoint, "http://nlp:8090/segment");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(
            SentenceClient::new(SegmenterConfig::new("  ")),
            Err(NlpError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_retryable_classification() {
        let server_err = NlpError::Api {
            status: 503,
            body: String::new(),
        };
        let client_err = NlpError::Api {
            status: 422,
            body: String::new(),
        };
        assert!(server_err.is_retryable());
        assert!(!client_err.is_retryable());
        assert!(!NlpError::InvalidResponse("x".into()).is_retryable());
    }
}
