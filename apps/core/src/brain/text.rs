//! Response text processing.
//!
//! Cleanup and truncation of responder output, plain keyword listing and
//! sensitive-word detection.

use std::collections::BTreeSet;

/// Suffix appended to truncated responses
const TRUNCATION_MARKER: &str = "...";

/// Post-processor for assistant responses
pub struct TextProcessor {
    max_length: usize,
    sensitive_words: Vec<String>,
}

impl TextProcessor {
    pub fn new(max_length: usize, sensitive_words: Vec<String>) -> Self {
        Self {
            max_length,
            sensitive_words: sensitive_words
                .into_iter()
                .map(|w| w.to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Collapse whitespace and cut to `max_length` characters.
    pub fn clean_response(&self, text: &str) -> String {
        let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if cleaned.chars().count() > self.max_length {
            let truncated: String = cleaned.chars().take(self.max_length).collect();
            format!("{}{}", truncated, TRUNCATION_MARKER)
        } else {
            cleaned
        }
    }

    /// Distinct lower-case words, sorted.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|word| !word.is_empty())
            .map(|word| word.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether the text contains any configured sensitive word.
    pub fn contains_sensitive(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.sensitive_words
            .iter()
            .any(|word| lowered.contains(word.as_str()))
    }
}
