//! Prompt text helpers.

/// Scene characters quoted in a fallback prompt.
const FALLBACK_SCENE_CHARS: usize = 50;

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Template prompt used when authoring fails for a scene.
pub fn fallback_prompt(scene: &str, style: &str) -> String {
    format!(
        "A detailed scene of {} in {} style.",
        truncate_chars(scene, FALLBACK_SCENE_CHARS),
        style
    )
}

/// Clean up an authored prompt: trim and cap its length.
///
/// Returns `None` when nothing usable is left.
pub fn normalize_prompt(raw: &str, max_chars: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate_chars(trimmed, max_chars).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("日本語のテキスト", 3), "日本語");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_fallback_prompt_template() {
        assert_eq!(
            fallback_prompt("A cat sat.", "anime"),
            "A detailed scene of A cat sat. in anime style."
        );
    }

    #[test]
    fn test_fallback_prompt_quotes_first_fifty_chars() {
        let scene = "x".repeat(80);
        let prompt = fallback_prompt(&scene, "noir");
        assert_eq!(prompt, format!("A detailed scene of {} in noir style.", "x".repeat(50)));
    }

    #[test]
    fn test_normalize_prompt() {
        assert_eq!(normalize_prompt("  A neon alley.  ", 512).as_deref(), Some("A neon alley."));
        assert_eq!(normalize_prompt("   ", 512), None);
        let long = "y".repeat(600);
        assert_eq!(normalize_prompt(&long, 512).map(|p| p.chars().count()), Some(512));
    }
}
