//! Client for the sentence segmentation sidecar.
//!
//! The sidecar wraps a statistical sentence splitter (e.g. spaCy) behind a
//! single `POST /segment` endpoint. It is optional: callers check for a
//! configured client and fall back to rule-based splitting without one.

pub mod client;
pub mod error;

pub use client::{SegmenterConfig, SentenceClient};
pub use error::{NlpError, NlpResult};
