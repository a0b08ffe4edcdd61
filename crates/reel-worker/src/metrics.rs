//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these calls are no-ops.

use metrics::counter;

use reel_models::JobStatus;

pub mod names {
    pub const JOBS_SUBMITTED: &str = "reel_jobs_submitted_total";
    pub const JOBS_FINISHED: &str = "reel_jobs_finished_total";
    pub const CLIPS_RESOLVED: &str = "reel_clips_resolved_total";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED).increment(1);
}

pub fn record_job_finished(status: JobStatus) {
    counter!(names::JOBS_FINISHED, "status" => status.as_str()).increment(1);
}

/// `outcome` is one of `success`, `failure` or `timeout`.
pub fn record_clip_resolved(outcome: &'static str) {
    counter!(names::CLIPS_RESOLVED, "outcome" => outcome).increment(1);
}
