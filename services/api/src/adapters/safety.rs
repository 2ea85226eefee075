//! services/api/src/adapters/safety.rs
//!
//! Heuristic detection of content-policy refusals in provider error text.
//!
//! Providers do not agree on a machine-readable refusal code, so a refusal is
//! recognized by phrase match against the error message. The phrase set comes
//! from configuration.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Case-insensitive phrase matcher for safety refusals.
#[derive(Clone, Debug)]
pub struct SafetyClassifier {
    pattern: Option<Regex>,
}

impl SafetyClassifier {
    pub const DEFAULT_PHRASES: [&'static str; 3] = ["safety", "policy", "content_policy"];

    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        let alternation = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        if alternation.is_empty() {
            return Self { pattern: None };
        }

        let pattern = match RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Some(re),
            Err(e) => {
                // Escaped literals always compile; this only trips on size limits.
                warn!("Safety phrase pattern rejected, refusals will not be detected: {}", e);
                None
            }
        };
        Self { pattern }
    }

    /// True when `message` looks like a content-policy refusal.
    pub fn is_refusal(&self, message: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|re| re.is_match(message))
            .unwrap_or(false)
    }
}

impl Default for SafetyClassifier {
    fn default() -> Self {
        Self::new(&Self::DEFAULT_PHRASES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phrases_match_case_insensitively() {
        let classifier = SafetyClassifier::default();
        assert!(classifier.is_refusal("Your request was rejected by our Safety system"));
        assert!(classifier.is_refusal("content_policy_violation"));
        assert!(!classifier.is_refusal("rate limit exceeded"));
    }

    #[test]
    fn phrases_are_literal_not_patterns() {
        let classifier = SafetyClassifier::new(&["nsfw.*"]);
        assert!(classifier.is_refusal("flagged as NSFW.* content"));
        assert!(!classifier.is_refusal("flagged as nsfw content"));
    }

    #[test]
    fn empty_phrase_set_never_matches() {
        let classifier = SafetyClassifier::new::<&str>(&[]);
        assert!(!classifier.is_refusal("safety"));
    }
}
