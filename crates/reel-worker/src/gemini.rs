//! Gemini client for scene-to-prompt authoring.
//!
//! Each scene is sent as user content with a storyboard-artist system
//! instruction carrying the requested style. Models are tried in order
//! until one answers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborators::PromptAuthoringService;
use crate::error::{WorkerError, WorkerResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Models to try, in order
    pub models: Vec<String>,
    /// API root, overridable for tests
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Read `GEMINI_API_KEY`, `GEMINI_MODEL` (comma-separated) and `GEMINI_BASE_URL`.
    ///
    /// Returns `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let mut config = Self::new(api_key);

        if let Ok(models) = std::env::var("GEMINI_MODEL") {
            let models: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !models.is_empty() {
                config.models = models;
            }
        }
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini API client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> WorkerResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(WorkerError::config_error("GEMINI_API_KEY is empty"));
        }
        if config.models.is_empty() {
            return Err(WorkerError::config_error("no Gemini models configured"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WorkerError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn system_instruction(style: &str) -> String {
        format!(
            "You are an expert cinematic storyboard artist. \
             Convert the following scene description into a single, hyper-detailed, technical, \
             and vivid text-to-video prompt, using the visual style: '{}'. \
             Focus on visual movement and rich detail. The final prompt should be less than 512 characters. \
             The output must be ONLY the prompt text, nothing else.",
            style
        )
    }

    async fn call_gemini_api(&self, model: &str, system: &str, scene: &str) -> WorkerResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let request = GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: scene.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "text/plain",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::ai_failed(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkerError::ai_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            WorkerError::ai_failed(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = gemini_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(WorkerError::ai_failed("No content in Gemini response"));
        }
        Ok(text)
    }
}

#[async_trait]
impl PromptAuthoringService for GeminiClient {
    async fn author_prompt(&self, scene: &str, style: &str) -> WorkerResult<String> {
        let system = Self::system_instruction(style);
        let mut last_error = None;

        for model in &self.config.models {
            debug!("Authoring prompt with Gemini model: {}", model);
            match self.call_gemini_api(model, &system, scene).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Gemini model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| WorkerError::ai_failed("All Gemini models failed")))
    }
}
