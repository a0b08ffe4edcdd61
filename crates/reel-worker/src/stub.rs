//! Deterministic in-process collaborators.
//!
//! Used by tests and by mock mode, where the service runs end to end
//! without any external accounts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use reel_models::{ClipHandle, OutputRef, RenderConfig, RenderStatus};

use crate::collaborators::{
    Collaborators, LocatorSigner, PromptAuthoringService, RenderGateway, SegmentationService,
};
use crate::error::{WorkerError, WorkerResult};

/// Video returned for every clip in mock mode.
pub const MOCK_VIDEO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

const HANDLE_PREFIX: &str = "stub-clip-";

/// Collaborators for mock mode: every clip renders after two polls and
/// resolves to [`MOCK_VIDEO_URL`].
pub fn mock_collaborators() -> Collaborators {
    Collaborators {
        segmenter: None,
        prompt_author: Some(Arc::new(StubPromptAuthor::default())),
        render_gateway: Some(Arc::new(
            StubRenderGateway::default().with_default(StubClip::CompleteAfter(2)),
        )),
        signer: Some(Arc::new(StubSigner::fixed(MOCK_VIDEO_URL))),
    }
}

/// Segmenter returning a fixed answer.
pub struct StubSegmenter {
    result: Result<Vec<String>, String>,
}

impl StubSegmenter {
    pub fn fixed(scenes: &[&str]) -> Self {
        Self {
            result: Ok(scenes.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: Err(reason.into()),
        }
    }
}

#[async_trait]
impl SegmentationService for StubSegmenter {
    async fn segment(&self, _text: &str) -> WorkerResult<Vec<String>> {
        self.result
            .clone()
            .map_err(WorkerError::segmentation_failed)
    }
}

#[derive(Debug, Clone, Default)]
enum AuthorMode {
    /// `"{style} shot: {scene}"`
    #[default]
    Echo,
    Fixed(String),
    /// Fail for scenes containing the marker, echo otherwise
    FailWhen(String),
    AlwaysFail,
}

/// Prompt author that never leaves the process.
#[derive(Debug, Default)]
pub struct StubPromptAuthor {
    mode: AuthorMode,
    calls: AtomicUsize,
}

impl StubPromptAuthor {
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            mode: AuthorMode::Fixed(response.into()),
            ..Default::default()
        }
    }

    pub fn failing_when(marker: impl Into<String>) -> Self {
        Self {
            mode: AuthorMode::FailWhen(marker.into()),
            ..Default::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            mode: AuthorMode::AlwaysFail,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PromptAuthoringService for StubPromptAuthor {
    async fn author_prompt(&self, scene: &str, style: &str) -> WorkerResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            AuthorMode::Echo => Ok(format!("{} shot: {}", style, scene)),
            AuthorMode::Fixed(response) => Ok(response.clone()),
            AuthorMode::FailWhen(marker) if scene.contains(marker.as_str()) => {
                Err(WorkerError::ai_failed("stub author refused scene"))
            }
            AuthorMode::FailWhen(_) => Ok(format!("{} shot: {}", style, scene)),
            AuthorMode::AlwaysFail => Err(WorkerError::ai_failed("stub author unavailable")),
        }
    }
}

/// Scripted behavior of one clip, by submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubClip {
    /// Report in-progress for `n` polls, then complete
    CompleteAfter(u32),
    /// Report in-progress for `n` polls, then fail with the reason
    FailAfter(u32, String),
    /// Never finishes
    Pending,
    /// Submission is rejected
    RejectSubmit,
    /// Every status poll errors
    PollError,
}

/// Render gateway following a per-clip script.
#[derive(Debug)]
pub struct StubRenderGateway {
    plan: Vec<StubClip>,
    default_clip: StubClip,
    submissions: Mutex<Vec<(String, RenderConfig)>>,
    polls: Mutex<HashMap<usize, u32>>,
}

impl Default for StubRenderGateway {
    fn default() -> Self {
        Self {
            plan: Vec::new(),
            default_clip: StubClip::CompleteAfter(0),
            submissions: Mutex::new(Vec::new()),
            polls: Mutex::new(HashMap::new()),
        }
    }
}

impl StubRenderGateway {
    /// Clip `i` follows `plan[i]`; clips past the end follow the default.
    pub fn with_plan(plan: Vec<StubClip>) -> Self {
        Self {
            plan,
            ..Default::default()
        }
    }

    pub fn with_default(mut self, clip: StubClip) -> Self {
        self.default_clip = clip;
        self
    }

    fn clip(&self, index: usize) -> &StubClip {
        self.plan.get(index).unwrap_or(&self.default_clip)
    }

    /// Every submission attempt, including rejected ones.
    pub fn submissions(&self) -> Vec<(String, RenderConfig)> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Status polls made for the clip at `index`.
    pub fn poll_count(&self, index: usize) -> u32 {
        self.polls
            .lock()
            .map(|p| p.get(&index).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Output key written for the clip at `index`.
    pub fn output_key(index: usize) -> String {
        format!("jobs/{}{}/output.mp4", HANDLE_PREFIX, index)
    }
}

#[async_trait]
impl RenderGateway for StubRenderGateway {
    async fn submit(&self, prompt: &str, config: &RenderConfig) -> WorkerResult<ClipHandle> {
        let index = {
            let mut submissions = self
                .submissions
                .lock()
                .map_err(|_| WorkerError::render_failed("stub state poisoned"))?;
            submissions.push((prompt.to_string(), *config));
            submissions.len() - 1
        };

        match self.clip(index) {
            StubClip::RejectSubmit => Err(WorkerError::render_failed("stub submission rejected")),
            _ => Ok(ClipHandle::new(format!("{}{}", HANDLE_PREFIX, index))),
        }
    }

    async fn poll(&self, handle: &ClipHandle) -> WorkerResult<RenderStatus> {
        let index: usize = handle
            .as_str()
            .strip_prefix(HANDLE_PREFIX)
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| WorkerError::render_failed(format!("unknown handle {}", handle)))?;

        let count = {
            let mut polls = self
                .polls
                .lock()
                .map_err(|_| WorkerError::render_failed("stub state poisoned"))?;
            let count = polls.entry(index).or_insert(0);
            *count += 1;
            *count
        };

        let in_progress = || RenderStatus::InProgress {
            detail: "InProgress".to_string(),
        };
        match self.clip(index) {
            StubClip::CompleteAfter(n) if count > *n => Ok(RenderStatus::Completed {
                output: OutputRef::new(Self::output_key(index)),
            }),
            StubClip::FailAfter(n, reason) if count > *n => Ok(RenderStatus::Failed {
                reason: reason.clone(),
            }),
            StubClip::PollError => Err(WorkerError::render_failed("stub status endpoint down")),
            _ => Ok(in_progress()),
        }
    }
}

#[derive(Debug, Clone)]
enum SignerMode {
    Prefix(String),
    Fixed(String),
    Fail,
    /// Wait, then sign like the default signer
    Slow(Duration),
}

/// Locator signer producing predictable URLs.
#[derive(Debug, Clone)]
pub struct StubSigner {
    mode: SignerMode,
}

impl Default for StubSigner {
    fn default() -> Self {
        Self::with_base("https://cdn.scriptreel.test")
    }
}

impl StubSigner {
    /// Sign as `{base}/{key}?signature=stub`.
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            mode: SignerMode::Prefix(base.into()),
        }
    }

    /// Return the same URL for every output.
    pub fn fixed(url: impl Into<String>) -> Self {
        Self {
            mode: SignerMode::Fixed(url.into()),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: SignerMode::Fail,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            mode: SignerMode::Slow(delay),
        }
    }

    /// URL the default signer produces for `key`.
    pub fn default_url(key: &str) -> String {
        format!("https://cdn.scriptreel.test/{}?signature=stub", key)
    }
}

#[async_trait]
impl LocatorSigner for StubSigner {
    async fn sign(&self, output: &OutputRef) -> WorkerResult<String> {
        match &self.mode {
            SignerMode::Prefix(base) => Ok(format!(
                "{}/{}?signature=stub",
                base.trim_end_matches('/'),
                output.key
            )),
            SignerMode::Fixed(url) => Ok(url.clone()),
            SignerMode::Fail => Err(WorkerError::signing_failed("stub signer offline")),
            SignerMode::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::default_url(&output.key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gateway_follows_plan() {
        let gateway = StubRenderGateway::with_plan(vec![
            StubClip::CompleteAfter(1),
            StubClip::RejectSubmit,
            StubClip::FailAfter(0, "filtered".into()),
        ]);
        let config = RenderConfig::with_seed(1);

        let first = gateway.submit("a", &config).await.unwrap();
        assert!(gateway.submit("b", &config).await.is_err());
        let third = gateway.submit("c", &config).await.unwrap();
        assert_eq!(gateway.submissions().len(), 3);

        assert!(matches!(
            gateway.poll(&first).await.unwrap(),
            RenderStatus::InProgress { .. }
        ));
        assert_eq!(
            gateway.poll(&first).await.unwrap(),
            RenderStatus::Completed {
                output: OutputRef::new("jobs/stub-clip-0/output.mp4")
            }
        );
        assert_eq!(
            gateway.poll(&third).await.unwrap(),
            RenderStatus::Failed {
                reason: "filtered".into()
            }
        );
        assert_eq!(gateway.poll_count(0), 2);
    }

    #[tokio::test]
    async fn test_unknown_handle_errors() {
        let gateway = StubRenderGateway::default();
        assert!(gateway.poll(&ClipHandle::new("arn:other")).await.is_err());
    }

    #[tokio::test]
    async fn test_signer_modes() {
        let output = OutputRef::new("jobs/x/output.mp4");
        assert_eq!(
            StubSigner::default().sign(&output).await.unwrap(),
            StubSigner::default_url("jobs/x/output.mp4")
        );
        assert_eq!(
            StubSigner::fixed(MOCK_VIDEO_URL).sign(&output).await.unwrap(),
            MOCK_VIDEO_URL
        );
        assert!(StubSigner::failing().sign(&output).await.is_err());
    }

    #[tokio::test]
    async fn test_author_modes() {
        let author = StubPromptAuthor::failing_when("dog");
        assert_eq!(
            author.author_prompt("A cat sat.", "anime").await.unwrap(),
            "anime shot: A cat sat."
        );
        assert!(author.author_prompt("A dog ran.", "anime").await.is_err());
        assert_eq!(author.calls(), 2);
    }
}
