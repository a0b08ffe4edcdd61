//! Worker configuration.

use std::str::FromStr;
use std::time::Duration;

/// Longest prompt the render service accepts, in characters.
pub const MAX_PROMPT_CHARS: usize = 512;

/// Pipeline timing and limits.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum pipelines running at once
    pub max_concurrent_jobs: usize,
    /// Wall-clock budget for the whole polling phase, measured from its start
    pub poll_deadline: Duration,
    /// Pause between polling rounds
    pub poll_interval: Duration,
    /// Pause between consecutive render submissions
    pub submit_delay: Duration,
    /// Pause after each prompt authoring request
    pub prompt_delay: Duration,
    /// Pause after script analysis
    pub analysis_delay: Duration,
    /// Prompt length limit in characters, never above [`MAX_PROMPT_CHARS`]
    pub max_prompt_chars: usize,
    /// Extra attempts for a failed status poll within one round
    pub poll_retries: u32,
    /// Base backoff between poll retries
    pub poll_retry_base_delay: Duration,
    /// Lifetime of signed clip locators
    pub presign_expiry: Duration,
    /// How long shutdown waits for in-flight jobs
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 8,
            poll_deadline: Duration::from_secs(600), // 10 minutes
            poll_interval: Duration::from_secs(15),
            submit_delay: Duration::from_millis(2000),
            prompt_delay: Duration::from_millis(1000),
            analysis_delay: Duration::from_millis(1000),
            max_prompt_chars: MAX_PROMPT_CHARS,
            poll_retries: 2,
            poll_retry_base_delay: Duration::from_millis(200),
            presign_expiry: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(60),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_or("PIPELINE_MAX_CONCURRENT_JOBS", defaults.max_concurrent_jobs)
                .max(1),
            poll_deadline: Duration::from_secs(env_or("PIPELINE_POLL_DEADLINE_SECS", 600)),
            poll_interval: Duration::from_secs(env_or("PIPELINE_POLL_INTERVAL_SECS", 15)),
            submit_delay: Duration::from_millis(env_or("PIPELINE_SUBMIT_DELAY_MS", 2000)),
            prompt_delay: Duration::from_millis(env_or("PIPELINE_PROMPT_DELAY_MS", 1000)),
            analysis_delay: Duration::from_millis(env_or("PIPELINE_ANALYSIS_DELAY_MS", 1000)),
            max_prompt_chars: env_or("PIPELINE_MAX_PROMPT_CHARS", defaults.max_prompt_chars)
                .clamp(1, MAX_PROMPT_CHARS),
            poll_retries: env_or("PIPELINE_POLL_RETRIES", defaults.poll_retries),
            poll_retry_base_delay: defaults.poll_retry_base_delay,
            presign_expiry: Duration::from_secs(env_or("PRESIGN_EXPIRY_SECS", 3600)),
            shutdown_timeout: Duration::from_secs(env_or("PIPELINE_SHUTDOWN_TIMEOUT_SECS", 60)),
        }
    }

    /// Short timings for mock mode, where every collaborator answers instantly.
    pub fn mock_mode(self) -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            submit_delay: Duration::from_millis(100),
            prompt_delay: Duration::from_millis(100),
            analysis_delay: Duration::from_millis(250),
            ..self
        }
    }
}
