//! Script-to-video job orchestration.
//!
//! This crate provides:
//! - An in-memory job store with single-writer records
//! - The four-phase generation pipeline
//! - A job executor running pipelines concurrently
//! - Collaborator traits with Gemini, Bedrock, S3 and segmenter adapters
//! - Deterministic stub collaborators for tests and mock mode

pub mod bedrock;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod executor;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod segmentation;
pub mod signer;
pub mod status;
pub mod store;
pub mod stub;

pub use collaborators::{
    Collaborators, LocatorSigner, PromptAuthoringService, RenderGateway, SegmentationService,
};
pub use config::{WorkerConfig, MAX_PROMPT_CHARS};
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::Pipeline;
pub use status::StatusQuery;
pub use store::{JobStore, JobWriter};
