//! The fixed, ordered list of detection patterns . Each pattern maps
//! a regex match to `(type, category, priority)` plus a key-extraction
//! function producing a stable `update_key`.

use memory_core::{Category, MemoryType, Priority};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::confidence;
use crate::types::DetectedMemory;

fn slug(s: &str) -> String {
    s.trim()
    .to_lowercase()
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { '-' })
    .collect::<String>()
    .split('-')
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("-")
}

static PREFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi prefer\s+([a-z0-9+.# ]+?)\s+over\s+([a-z0-9+.# ]+?)(?:[.!,]|$)").unwrap()
});

static WORK_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi work (?:at|for)\s+([a-z0-9&.,' \-]+?)(?:[.!,]|$)").unwrap());

static LIVES_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi live in\s+([a-z0-9,.\- ]+?)(?:[.!,]|$)").unwrap());

static PROJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:i'?m working on|my project is called)\s+([a-z0-9_\- ]+?)(?:[.!,]|$)")
    .unwrap()
});

static PERFORMANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmy\s+([a-z ]{2,20}?)\s+is\s+([\w.%]+)(?:[.!,]|$)").unwrap()
});

/// Run every pattern against `text` in a fixed order, returning zero or
/// more candidates. Patterns are independent: more than one may fire on
/// the same input.
pub fn detect_all(text: &str) -> Vec<DetectedMemory> {
    let confidence = confidence::score(text);
    let mut out = Vec::new();

    if let Some(caps) = PREFERENCE.captures(text) {
        let subject = slug(&caps[1]);
        out.push(DetectedMemory {
            content: text.trim().to_string(),
            memory_type: MemoryType::Preference,
            category: Category::Personal,
            priority: Priority::Medium,
            update_key: Some(format!("preference:{subject}")),
            confidence,
        });
    }

    if let Some(caps) = WORK_AT.captures(text) {
        let _company = caps[1].trim();
        out.push(DetectedMemory {
            content: text.trim().to_string(),
            memory_type: MemoryType::Fact,
            category: Category::Business,
            priority: Priority::Medium,
            update_key: Some("work:company".to_string()),
            confidence,
        });
    }

    if let Some(_caps) = LIVES_IN.captures(text) {
        out.push(DetectedMemory {
            content: text.trim().to_string(),
            memory_type: MemoryType::Fact,
            category: Category::Personal,
            priority: Priority::Medium,
            update_key: Some("location:residence".to_string()),
            confidence,
        });
    }

    if let Some(caps) = PROJECT.captures(text) {
        let name = slug(&caps[1]);
        out.push(DetectedMemory {
            content: text.trim().to_string(),
            memory_type: MemoryType::Context,
            category: Category::Project,
            priority: Priority::Medium,
            update_key: Some(format!("project:{name}")),
            confidence,
        });
    }

    if let Some(caps) = PERFORMANCE.captures(text) {
        let metric = slug(&caps[1]);
        out.push(DetectedMemory {
            content: text.trim().to_string(),
            memory_type: MemoryType::Fact,
            category: Category::Personal,
            priority: Priority::Low,
            update_key: Some(format!("performance:{metric}")),
            confidence,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_pattern_extracts_key() {
        let found = detect_all("I prefer TypeScript over JavaScript");
        let hit = found.iter().find(|d| d.update_key.as_deref() == Some("preference:typescript"));
        assert!(hit.is_some());
    }

    #[test]
    fn work_pattern_extracts_key() {
        let found = detect_all("I work at Acme Corp on the platform team");
        assert!(found.iter().any(|d| d.update_key.as_deref() == Some("work:company")));
    }

    #[test]
    fn location_pattern_extracts_key() {
        let found = detect_all("I live in Austin these days");
        assert!(found.iter().any(|d| d.update_key.as_deref() == Some("location:residence")));
    }

    #[test]
    fn project_pattern_extracts_key() {
        let found = detect_all("I'm working on Aurora, the new rendering pipeline");
        assert!(found.iter().any(|d| d
            .update_key
                .as_deref()
                .is_some_and(|k| k.starts_with("project:"))));
    }

    #[test]
    fn performance_pattern_extracts_key() {
        let found = detect_all("My retention rate is 92%");
        assert!(found.iter().any(|d| d
            .update_key
                .as_deref()
                .is_some_and(|k| k.starts_with("performance:"))));
    }

    #[test]
    fn unrelated_text_detects_nothing() {
        assert!(detect_all("Cloudy with a chance of rain tomorrow").is_empty());
    }
}
