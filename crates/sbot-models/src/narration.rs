//! Narration length policy and deterministic fallback script.

/// Minimum usable script length in characters (generator level).
pub const MIN_SCRIPT_CHARS: usize = 50;

/// Minimum usable script length in words (pipeline level).
pub const MIN_SCRIPT_WORDS: usize = 20;

/// Assumed narration pace for duration estimates.
pub const WORDS_PER_MINUTE: usize = 150;

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimate narration length in seconds at the configured pace.
pub fn estimate_duration_secs(text: &str) -> f64 {
    word_count(text) as f64 / WORDS_PER_MINUTE as f64 * 60.0
}

/// Deterministic fallback narration built from the topic string.
///
/// Used whenever the generated script is missing or too short. Always
/// contains the topic verbatim (lowercased) and clears both length
/// minimums.
pub fn fallback_script(topic: &str) -> String {
    format!(
        "Did you know that {} is more fascinating than you think? \
         Let me explain why this matters in just 60 seconds. \
         Like and subscribe for more amazing facts!",
        topic.to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one two  three\nfour"), 4);
    }

    #[test]
    fn test_estimate_duration() {
        // 150 words at 150 wpm is one minute
        let text = vec!["word"; 150].join(" ");
        assert!((estimate_duration_secs(&text) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_contains_topic() {
        let script = fallback_script("Suspension Bridges");
        assert!(script.contains("suspension bridges"));
        assert!(script.len() >= MIN_SCRIPT_CHARS);
        assert!(word_count(&script) >= MIN_SCRIPT_WORDS);
    }

    #[test]
    fn test_fallback_deterministic() {
        assert_eq!(fallback_script("bridges"), fallback_script("bridges"));
    }
}
