//! Video generation job record.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::{ClipHandle, ClipOutcome, JobStatus, VideoRequest};

/// Progress text of a freshly registered job.
pub const QUEUED_PROGRESS: &str = "Awaiting generation...";

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One end-to-end script-to-video job.
///
/// Every mutator enforces the record invariants: status only moves forward
/// (or to `Failed`), `video_url` is present exactly when the job is
/// `Completed`, and a terminal record rejects all further writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Current pipeline phase
    pub status: JobStatus,

    /// Human-readable progress text (advisory only)
    pub progress: String,

    /// Final video locator, set only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// The submission this job was created from
    pub request: VideoRequest,

    /// Scene texts in script order
    #[serde(default)]
    pub scenes: Vec<String>,

    /// Render prompts, index-aligned with `scenes`
    #[serde(default)]
    pub prompts: Vec<String>,

    /// Sub-job handles, index-aligned with `prompts`; `None` where submission failed
    #[serde(default)]
    pub handles: Vec<Option<ClipHandle>>,

    /// Result slots, index-aligned with `handles`; `None` until resolved
    #[serde(default)]
    pub outcomes: Vec<Option<ClipOutcome>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job for a request.
    pub fn new(request: VideoRequest) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            progress: QUEUED_PROGRESS.to_string(),
            video_url: None,
            request,
            scenes: Vec::new(),
            prompts: Vec::new(),
            handles: Vec::new(),
            outcomes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_live(&self) -> ModelResult<()> {
        if self.is_terminal() {
            return Err(ModelError::AlreadyTerminal(self.status));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Move to a later non-terminal phase.
    ///
    /// Use [`Job::complete`] or [`Job::fail`] to reach a terminal state.
    pub fn advance(&mut self, next: JobStatus, progress: impl Into<String>) -> ModelResult<()> {
        if next.is_terminal() || !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.progress = progress.into();
        self.touch();
        Ok(())
    }

    /// Replace the progress text.
    pub fn set_progress(&mut self, progress: impl Into<String>) -> ModelResult<()> {
        self.ensure_live()?;
        self.progress = progress.into();
        self.touch();
        Ok(())
    }

    pub fn set_scenes(&mut self, scenes: Vec<String>) -> ModelResult<()> {
        self.ensure_live()?;
        self.scenes = scenes;
        self.touch();
        Ok(())
    }

    pub fn set_prompts(&mut self, prompts: Vec<String>) -> ModelResult<()> {
        self.ensure_live()?;
        self.prompts = prompts;
        self.touch();
        Ok(())
    }

    /// Record the handle for the next prompt and open an empty result slot for it.
    pub fn push_handle(&mut self, handle: Option<ClipHandle>) -> ModelResult<()> {
        self.ensure_live()?;
        self.handles.push(handle);
        self.outcomes.push(None);
        self.touch();
        Ok(())
    }

    /// Settle the result slot at `index`. A slot can only be settled once.
    pub fn resolve_slot(&mut self, index: usize, outcome: ClipOutcome) -> ModelResult<()> {
        self.ensure_live()?;
        let len = self.outcomes.len();
        let slot = self
            .outcomes
            .get_mut(index)
            .ok_or(ModelError::SlotOutOfRange { index, len })?;
        if slot.is_some() {
            return Err(ModelError::SlotAlreadyResolved(index));
        }
        *slot = Some(outcome);
        self.touch();
        Ok(())
    }

    /// Number of slots holding an outcome.
    pub fn resolved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_some()).count()
    }

    /// Indices of slots that have not been settled yet, ascending.
    pub fn unresolved_slots(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Signed locators of successful slots, in slot order.
    pub fn successful_urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .flatten()
            .filter_map(ClipOutcome::url)
            .collect()
    }

    /// Finish the job with its final video locator.
    pub fn complete(&mut self, video_url: impl Into<String>, progress: impl Into<String>) -> ModelResult<()> {
        if !self.status.can_transition_to(JobStatus::Completed) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: JobStatus::Completed,
            });
        }
        self.status = JobStatus::Completed;
        self.video_url = Some(video_url.into());
        self.progress = progress.into();
        self.touch();
        Ok(())
    }

    /// Finish the job without a result.
    pub fn fail(&mut self, progress: impl Into<String>) -> ModelResult<()> {
        if !self.status.can_transition_to(JobStatus::Failed) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: JobStatus::Failed,
            });
        }
        self.status = JobStatus::Failed;
        self.video_url = None;
        self.progress = progress.into();
        self.touch();
        Ok(())
    }
}
