//! Shared data models for the ScriptReel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video generation jobs and their phase state machine
//! - Client submission payloads
//! - Render sub-job handles, parameters and outcomes

pub mod error;
pub mod job;
pub mod render;
pub mod request;
pub mod status;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobId, QUEUED_PROGRESS};
pub use render::{ClipHandle, ClipOutcome, OutputRef, RenderConfig, RenderStatus, MAX_RENDER_SEED};
pub use request::{VideoRequest, MAX_SCRIPT_CHARS, MAX_STYLE_CHARS};
pub use status::JobStatus;
