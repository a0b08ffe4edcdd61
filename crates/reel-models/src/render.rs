//! Render sub-job types shared by the orchestrator and the render adapters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a submitted render sub-job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipHandle(pub String);

impl ClipHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a finished clip was written by the render service.
///
/// This is not retrievable by clients until it has been signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OutputRef {
    /// Object key relative to the output bucket
    pub key: String,
}

impl OutputRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Generation parameters sent with every render submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderConfig {
    /// Clip duration in seconds
    pub duration_seconds: u32,
    /// Frames per second
    pub fps: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Per-submission random seed
    pub seed: u32,
}

/// Largest seed value accepted by the render service.
pub const MAX_RENDER_SEED: u32 = 2_147_483_646;

impl RenderConfig {
    /// Default clip parameters with the given seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            duration_seconds: 6,
            fps: 24,
            width: 1280,
            height: 720,
            seed: seed.min(MAX_RENDER_SEED),
        }
    }

    /// Dimension string in `WIDTHxHEIGHT` form.
    pub fn dimension(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Result of polling one render sub-job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenderStatus {
    /// Still rendering; `detail` is the service's own status text
    InProgress { detail: String },
    /// Finished; output is waiting at `output`
    Completed { output: OutputRef },
    /// The service gave up on this clip
    Failed { reason: String },
}

/// Resolved result of one sub-job position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClipOutcome {
    /// Clip rendered and signed
    Success { url: String },
    /// Clip never produced a usable result
    Failure { reason: String },
}

impl ClipOutcome {
    pub fn success(url: impl Into<String>) -> Self {
        Self::Success { url: url.into() }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ClipOutcome::Success { .. })
    }

    /// Signed locator for successful outcomes.
    pub fn url(&self) -> Option<&str> {
        match self {
            ClipOutcome::Success { url } => Some(url),
            ClipOutcome::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::with_seed(42);
        assert_eq!(config.duration_seconds, 6);
        assert_eq!(config.fps, 24);
        assert_eq!(config.dimension(), "1280x720");
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_seed_is_clamped() {
        assert_eq!(RenderConfig::with_seed(u32::MAX).seed, MAX_RENDER_SEED);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = ClipOutcome::success("https://cdn/clip.mp4");
        let bad = ClipOutcome::failure("content filtered");
        assert!(ok.is_success());
        assert_eq!(ok.url(), Some("https://cdn/clip.mp4"));
        assert!(!bad.is_success());
        assert_eq!(bad.url(), None);
    }
}
