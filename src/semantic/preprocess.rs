//! Text preprocessing for embedding input and deduplication.
//!
//! Two concerns live here:
//! - `normalize_text`: the case-insensitive key used to deduplicate
//!   extracted snippets within a single page
//! - `prepare_for_embedding`: input hygiene before text reaches the encoder

/// Maximum content length for embedding input (characters, not tokens)
const MAX_CONTENT_LENGTH: usize = 512;

/// Ellipsis suffix when content is truncated
const TRUNCATION_SUFFIX: &str = "...";

/// Normalization key for per-page snippet deduplication.
///
/// Two snippets collide when their trimmed, lowercased text is identical;
/// the first occurrence wins.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Prepare a snippet for embedding generation.
///
/// Returns `None` if the text is empty after trimming. Long content is
/// truncated to `MAX_CONTENT_LENGTH` with an ellipsis.
pub fn prepare_for_embedding(text: &str) -> Option<String> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    Some(truncate_content(text))
}

fn truncate_content(content: &str) -> String {
    if content.len() <= MAX_CONTENT_LENGTH {
        return content.to_string();
    }

    // Truncate by chars, not bytes, to avoid splitting UTF-8 sequences
    let max_chars = MAX_CONTENT_LENGTH - TRUNCATION_SUFFIX.len();
    let truncated: String = content.chars().take(max_chars).collect();

    format!("{}{}", truncated, TRUNCATION_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_trims() {
        assert_eq!(normalize_text("  Swift Concurrency  "), "swift concurrency");
        assert_eq!(normalize_text("swift concurrency"), "swift concurrency");
    }

    #[test]
    fn test_normalized_duplicates_collide() {
        assert_eq!(
            normalize_text("Swift Concurrency"),
            normalize_text("swift concurrency")
        );
    }

    #[test]
    fn test_empty_text_returns_none() {
        assert!(prepare_for_embedding("").is_none());
        assert!(prepare_for_embedding("   \n\t").is_none());
    }

    #[test]
    fn test_short_text_passes_through() {
        let result = prepare_for_embedding("  Swift Charts  ");
        assert_eq!(result, Some("Swift Charts".to_string()));
    }

    #[test]
    fn test_truncation() {
        let long = "x".repeat(600);
        let result = prepare_for_embedding(&long).unwrap();

        assert!(result.len() <= MAX_CONTENT_LENGTH);
        assert!(result.ends_with(TRUNCATION_SUFFIX));
    }
}
