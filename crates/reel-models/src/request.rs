//! Client submission payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Maximum script length accepted at submission (characters).
pub const MAX_SCRIPT_CHARS: u64 = 20_000;

/// Maximum style descriptor length (characters).
pub const MAX_STYLE_CHARS: u64 = 200;

/// A script plus the visual style it should be rendered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct VideoRequest {
    /// Free-form script text
    #[validate(length(min = 1, max = 20_000), custom(function = "not_blank"))]
    pub script: String,
    /// Visual style, e.g. "anime" or "film noir"
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub style: String,
}

impl VideoRequest {
    pub fn new(script: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            style: style.into(),
        }
    }

    /// Short script prefix for log lines.
    pub fn script_preview(&self) -> String {
        self.script.chars().take(30).collect()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = VideoRequest::new("A cat sat. A dog ran.", "anime");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(VideoRequest::new("   ", "anime").validate().is_err());
        assert!(VideoRequest::new("A cat sat.", "").validate().is_err());
    }

    #[test]
    fn test_oversized_style_rejected() {
        let style = "x".repeat(MAX_STYLE_CHARS as usize + 1);
        assert!(VideoRequest::new("A cat sat.", style).validate().is_err());
    }

    #[test]
    fn test_script_limit_is_inclusive() {
        let at_limit = "a".repeat(MAX_SCRIPT_CHARS as usize);
        assert!(VideoRequest::new(at_limit.clone(), "anime").validate().is_ok());
        assert!(VideoRequest::new(at_limit + "a", "anime").validate().is_err());
    }

    #[test]
    fn test_script_preview_is_char_bounded() {
        let req = VideoRequest::new("é".repeat(40), "anime");
        assert_eq!(req.script_preview().chars().count(), 30);
    }
}
