use crate::deny_list::contains_sensitive_content;
use crate::patterns::detect_all;
use crate::types::DetectedMemory;

/// Extract zero or more memory candidates from a free-text utterance.
/// A sensitive-content mention suppresses *all* detection for the input,
/// not just the matching pattern.
pub fn detect(text: &str) -> Vec<DetectedMemory> {
    if contains_sensitive_content(text) {
        return Vec::new();
    }
    detect_all(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_content_suppresses_all_detection() {
        // S3
        let found = detect("My password is hunter2");
        assert!(found.is_empty());
    }

    #[test]
    fn sensitive_mention_suppresses_otherwise_matching_pattern() {
        let found = detect("I prefer storing my password in a vault over a sticky note");
        assert!(found.is_empty());
    }

    #[test]
    fn ordinary_preference_is_detected_with_high_confidence() {
        let found = detect("I prefer TypeScript over JavaScript");
        assert!(!found.is_empty());
        assert!(found[0].confidence >= 0.5);
    }
}
