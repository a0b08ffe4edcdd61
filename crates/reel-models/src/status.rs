//! Job phase state machine.
//!
//! A job walks the phases in declaration order and may jump to
//! [`JobStatus::Failed`] from any non-terminal phase. It never moves backwards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pipeline phase of a video generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Registered, waiting for an orchestrator slot
    #[default]
    Queued,
    /// Splitting the script into scenes
    AnalyzingScript,
    /// Authoring one render prompt per scene
    GeneratingPrompts,
    /// Submitting render sub-jobs
    InvokingRender,
    /// Polling sub-jobs until they resolve or the deadline passes
    PollingClips,
    /// At least one clip rendered; `video_url` is set
    Completed,
    /// Nothing usable was produced
    Failed,
}

impl JobStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::AnalyzingScript => "ANALYZING_SCRIPT",
            JobStatus::GeneratingPrompts => "GENERATING_PROMPTS",
            JobStatus::InvokingRender => "INVOKING_RENDER",
            JobStatus::PollingClips => "POLLING_CLIPS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Position in the forward phase order. Both terminal states share the last rank.
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::AnalyzingScript => 1,
            JobStatus::GeneratingPrompts => 2,
            JobStatus::InvokingRender => 3,
            JobStatus::PollingClips => 4,
            JobStatus::Completed | JobStatus::Failed => 5,
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job in this state may move to `next`.
    ///
    /// Terminal states accept nothing. `Failed` is reachable from every
    /// other state; everything else must move strictly forward.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Failed {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
