//! Sensitive-content deny list: suppresses *all* detection for an input
//! that even mentions one of these terms.

const DENY_TERMS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api key",
    "ssn",
    "credit card",
    "bank account",
    "pin",
    "private key",
    "oauth",
];

pub fn contains_sensitive_content(text: &str) -> bool {
    let lower = text.to_lowercase();
    DENY_TERMS.iter().any(|term| lower.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_password_mentions() {
        assert!(contains_sensitive_content("My password is hunter2"));
    }

    #[test]
    fn is_case_insensitive() {
        assert!(contains_sensitive_content("here's my API KEY: xyz"));
    }

    #[test]
    fn allows_unrelated_text() {
        assert!(!contains_sensitive_content("I prefer TypeScript over JavaScript"));
    }
}
