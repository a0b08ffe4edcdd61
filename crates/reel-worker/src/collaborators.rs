//! External services the pipeline depends on.
//!
//! Each service is a trait object so that the real adapters (Gemini,
//! Bedrock, S3, the segmenter sidecar) and the deterministic stubs can be
//! swapped without touching the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use reel_models::{ClipHandle, OutputRef, RenderConfig, RenderStatus};
use reel_nlp::SentenceClient;
use reel_storage::S3Client;

use crate::bedrock::{BedrockConfig, BedrockRenderGateway};
use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::signer::S3LocatorSigner;

/// Splits script text into ordered sentences.
#[async_trait]
pub trait SegmentationService: Send + Sync {
    async fn segment(&self, text: &str) -> WorkerResult<Vec<String>>;
}

/// Writes one visual prompt for one scene.
#[async_trait]
pub trait PromptAuthoringService: Send + Sync {
    async fn author_prompt(&self, scene: &str, style: &str) -> WorkerResult<String>;
}

/// Asynchronous video rendering service.
#[async_trait]
pub trait RenderGateway: Send + Sync {
    /// Start rendering one clip.
    async fn submit(&self, prompt: &str, config: &RenderConfig) -> WorkerResult<ClipHandle>;

    /// Report the current state of a submitted clip.
    async fn poll(&self, handle: &ClipHandle) -> WorkerResult<RenderStatus>;
}

/// Turns a storage reference into a time-limited retrievable URL.
#[async_trait]
pub trait LocatorSigner: Send + Sync {
    async fn sign(&self, output: &OutputRef) -> WorkerResult<String>;
}

/// The set of collaborators a pipeline is built from.
///
/// Segmentation is optional; the pipeline falls back to a local splitter
/// without it. The other three are required before any job can be accepted.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub segmenter: Option<Arc<dyn SegmentationService>>,
    pub prompt_author: Option<Arc<dyn PromptAuthoringService>>,
    pub render_gateway: Option<Arc<dyn RenderGateway>>,
    pub signer: Option<Arc<dyn LocatorSigner>>,
}

impl Collaborators {
    /// Build the real adapters from environment variables.
    ///
    /// Adapters whose configuration is missing or invalid are left out and
    /// logged; the service still starts but rejects submissions.
    pub fn from_env(config: &WorkerConfig) -> Self {
        let segmenter: Option<Arc<dyn SegmentationService>> = match SentenceClient::from_env() {
            Some(Ok(client)) => {
                info!("Sentence segmenter sidecar configured");
                Some(Arc::new(client))
            }
            Some(Err(e)) => {
                warn!("Sentence segmenter unavailable, using local splitter: {}", e);
                None
            }
            None => {
                info!("SEGMENTER_URL not set, using local sentence splitter");
                None
            }
        };

        let prompt_author: Option<Arc<dyn PromptAuthoringService>> =
            match GeminiConfig::from_env().map(GeminiClient::new) {
                Some(Ok(client)) => Some(Arc::new(client)),
                Some(Err(e)) => {
                    warn!("Gemini client unavailable: {}", e);
                    None
                }
                None => {
                    warn!("GEMINI_API_KEY not set, prompt authoring disabled");
                    None
                }
            };

        let render_gateway: Option<Arc<dyn RenderGateway>> =
            match BedrockConfig::from_env().and_then(BedrockRenderGateway::new) {
                Ok(gateway) => Some(Arc::new(gateway)),
                Err(e) => {
                    warn!("Render gateway unavailable: {}", e);
                    None
                }
            };

        let signer: Option<Arc<dyn LocatorSigner>> = match S3Client::from_env() {
            Ok(client) => Some(Arc::new(S3LocatorSigner::new(client, config.presign_expiry))),
            Err(e) => {
                warn!("Locator signer unavailable: {}", e);
                None
            }
        };

        Self {
            segmenter,
            prompt_author,
            render_gateway,
            signer,
        }
    }

    /// Names of required collaborators that are not configured.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.prompt_author.is_none() {
            missing.push("prompt_author");
        }
        if self.render_gateway.is_none() {
            missing.push("render_gateway");
        }
        if self.signer.is_none() {
            missing.push("signer");
        }
        missing
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{StubPromptAuthor, StubRenderGateway, StubSigner};

    #[test]
    fn test_missing_lists_required_collaborators() {
        let collaborators = Collaborators::default();
        assert_eq!(
            collaborators.missing(),
            vec!["prompt_author", "render_gateway", "signer"]
        );
        assert!(!collaborators.is_ready());
    }

    #[test]
    fn test_segmenter_is_optional() {
        let collaborators = Collaborators {
            segmenter: None,
            prompt_author: Some(Arc::new(StubPromptAuthor::default())),
            render_gateway: Some(Arc::new(StubRenderGateway::default())),
            signer: Some(Arc::new(StubSigner::default())),
        };
        assert!(collaborators.is_ready());
    }
}
