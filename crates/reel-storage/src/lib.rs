//! S3 storage client for rendered clips.
//!
//! This crate provides:
//! - Environment-driven S3 configuration
//! - Presigned GET URL generation for clip delivery
//! - Bucket connectivity checks

pub mod client;
pub mod error;

pub use client::{S3Client, S3Config, DEFAULT_PRESIGN_EXPIRY_SECS, MAX_PRESIGN_EXPIRY_SECS};
pub use error::{StorageError, StorageResult};
