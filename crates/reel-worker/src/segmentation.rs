//! Scene segmentation.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

use reel_nlp::SentenceClient;

use crate::collaborators::SegmentationService;
use crate::error::WorkerResult;

/// A run of non-terminator characters followed by any terminators.
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid sentence regex"));

/// Split text on `.`, `!` and `?`, keeping the terminators.
///
/// Fragments are trimmed and empty fragments dropped.
pub fn naive_split(text: &str) -> Vec<String> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strategy used to turn a script into scenes.
#[derive(Clone)]
pub enum SceneSplitter {
    /// Ask the segmentation service, falling back to [`naive_split`] on error.
    Service(Arc<dyn SegmentationService>),
    /// Local punctuation splitter only.
    Fallback,
}

impl SceneSplitter {
    pub fn new(service: Option<Arc<dyn SegmentationService>>) -> Self {
        match service {
            Some(service) => Self::Service(service),
            None => Self::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SceneSplitter::Fallback)
    }

    /// Split a script into ordered scenes. Never fails.
    pub async fn split(&self, script: &str) -> Vec<String> {
        match self {
            SceneSplitter::Service(service) => match service.segment(script).await {
                Ok(scenes) => scenes
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                Err(e) => {
                    warn!("Segmentation service failed, using local splitter: {}", e);
                    naive_split(script)
                }
            },
            SceneSplitter::Fallback => naive_split(script),
        }
    }
}

#[async_trait]
impl SegmentationService for SentenceClient {
    async fn segment(&self, text: &str) -> WorkerResult<Vec<String>> {
        Ok(SentenceClient::segment(self, text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;

    struct BrokenSegmenter;

    #[async_trait]
    impl SegmentationService for BrokenSegmenter {
        async fn segment(&self, _text: &str) -> WorkerResult<Vec<String>> {
            Err(WorkerError::segmentation_failed("model not loaded"))
        }
    }

    struct PaddedSegmenter;

    #[async_trait]
    impl SegmentationService for PaddedSegmenter {
        async fn segment(&self, _text: &str) -> WorkerResult<Vec<String>> {
            Ok(vec![" One. ".to_string(), "   ".to_string(), "Two.".to_string()])
        }
    }

    #[test]
    fn test_naive_split_basic() {
        assert_eq!(naive_split("A cat sat. A dog ran."), vec!["A cat sat.", "A dog ran."]);
    }

    #[test]
    fn test_naive_split_keeps_terminator_runs() {
        assert_eq!(
            naive_split("Wait... what?! Run!"),
            vec!["Wait...", "what?!", "Run!"]
        );
    }

    #[test]
    fn test_naive_split_trailing_fragment() {
        assert_eq!(
            naive_split("First line. no ending"),
            vec!["First line.", "no ending"]
        );
    }

    #[test]
    fn test_naive_split_drops_empty_fragments() {
        assert!(naive_split("").is_empty());
        assert!(naive_split("   ").is_empty());
        assert!(naive_split("?!...").is_empty());
        assert_eq!(naive_split("  Hello.   \n  "), vec!["Hello."]);
    }

    #[tokio::test]
    async fn test_service_failure_falls_back() {
        let splitter = SceneSplitter::new(Some(Arc::new(BrokenSegmenter)));
        assert!(!splitter.is_fallback());
        assert_eq!(
            splitter.split("A cat sat. A dog ran.").await,
            vec!["A cat sat.", "A dog ran."]
        );
    }

    #[tokio::test]
    async fn test_service_output_is_cleaned() {
        let splitter = SceneSplitter::new(Some(Arc::new(PaddedSegmenter)));
        assert_eq!(splitter.split("ignored").await, vec!["One.", "Two."]);
    }

    #[tokio::test]
    async fn test_fallback_strategy() {
        let splitter = SceneSplitter::new(None);
        assert!(splitter.is_fallback());
        assert_eq!(splitter.split("Hi! Bye?").await, vec!["Hi!", "Bye?"]);
    }
}
