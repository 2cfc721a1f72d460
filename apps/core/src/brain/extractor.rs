//! Expression and entity extraction.
//!
//! Pulls candidate equations, function definitions, numeric literals and
//! variable names out of free text with a fixed set of regex rules.
//! Extraction never fails: absence of a match yields an empty container or `None`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Words excluded from variable extraction (compared case-insensitively).
const VARIABLE_STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// A fragment pulled out of free text, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedExpression {
    /// Name of the rule that matched
    pub pattern: String,
    /// The matched fragment, trimmed
    pub fragment: String,
}

// Coefficient-letter-operator-operand = operand, e.g. "2x + 5 = 13".
const INLINE_EQUATION: &str =
    r"(?i)((?:\d+(?:\.\d+)?)?[a-zA-Z]\s*[+\-*/]\s*[a-zA-Z0-9]+\s*=\s*[a-zA-Z0-9]+)";

// NOTE: expect() is acceptable here: the patterns are constants, a failure is a programming error.
static EXPRESSION_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("equation", Regex::new(INLINE_EQUATION).expect("Invalid regex: inline equation")),
        (
            "derivative",
            Regex::new(r"(?i)(derivative|differentiate|d/d[a-zA-Z])")
                .expect("Invalid regex: derivative keywords"),
        ),
        (
            "integral",
            Regex::new(r"(?i)(integral|integrate|∫)").expect("Invalid regex: integral keywords"),
        ),
        (
            "function",
            Regex::new(r"(?i)([a-zA-Z]\s*\([^)]*\))").expect("Invalid regex: function call"),
        ),
        ("number", Regex::new(r"(\d+\.?\d*)").expect("Invalid regex: number")),
        ("variable", Regex::new(r"(?i)([a-zA-Z])").expect("Invalid regex: variable")),
        ("operator", Regex::new(r"([+\-*/^=<>])").expect("Invalid regex: operator")),
        ("parentheses", Regex::new(r"([()])").expect("Invalid regex: parentheses")),
        ("brackets", Regex::new(r"([\[\]])").expect("Invalid regex: brackets")),
    ]
});

static EQUATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(INLINE_EQUATION).expect("Invalid regex: inline equation"),
        Regex::new(r"(?i)solve\s+([^.!?]+)").expect("Invalid regex: solve clause"),
        Regex::new(r"([^.!?]*\s*=\s*[^.!?]*)").expect("Invalid regex: any equality"),
    ]
});

static FUNCTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)([a-zA-Z]\s*\([^)]*\)\s*=\s*[^.!?]+)")
            .expect("Invalid regex: function definition"),
        Regex::new(r"(?i)(?:derivative|integral)\s+(?:of\s+)?([^.!?]+)")
            .expect("Invalid regex: calculus target"),
        Regex::new(r"([a-zA-Z0-9^+\-*/()\s]+)").expect("Invalid regex: catch-all expression"),
    ]
});

static EQUATION_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(solve|find|calculate|compute)\b").expect("Invalid regex: equation filler")
});

static FUNCTION_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(derivative|integral|of)\b").expect("Invalid regex: function filler")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.?\d*").expect("Invalid regex: signed number"));

static SINGLE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]\b").expect("Invalid regex: single letter"));

/// Extractor for math fragments in free text
pub struct ExpressionExtractor {
    stopwords: HashSet<&'static str>,
}

impl Default for ExpressionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionExtractor {
    pub fn new() -> Self {
        Self {
            stopwords: VARIABLE_STOPWORDS.iter().copied().collect(),
        }
    }

    /// Run every rule and keep each distinct fragment with the first rule that produced it.
    pub fn extract_tagged(&self, text: &str) -> Vec<ExtractedExpression> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for (name, rule) in EXPRESSION_RULES.iter() {
            for caps in rule.captures_iter(text) {
                let fragment = caps[1].trim();
                if fragment.is_empty() || !seen.insert(fragment.to_string()) {
                    continue;
                }
                found.push(ExtractedExpression {
                    pattern: (*name).to_string(),
                    fragment: fragment.to_string(),
                });
            }
        }

        found
    }

    /// Union of all rule matches, trimmed and deduplicated. Order is not significant.
    pub fn extract_expressions(&self, text: &str) -> HashSet<String> {
        self.extract_tagged(text)
            .into_iter()
            .map(|e| e.fragment)
            .collect()
    }

    /// Extract the first equation-like fragment, with filler verbs removed.
    pub fn extract_equation(&self, text: &str) -> Option<String> {
        first_cleaned_match(&EQUATION_PATTERNS, &EQUATION_FILLER, text, 0)
    }

    /// Extract a function definition or calculus target.
    ///
    /// The last rule is a catch-all over alphanumerics and operators, so this
    /// returns `Some` for most non-empty text. Results of two characters or
    /// fewer are rejected.
    pub fn extract_function(&self, text: &str) -> Option<String> {
        first_cleaned_match(&FUNCTION_PATTERNS, &FUNCTION_FILLER, text, 2)
    }

    /// Extract optionally-signed decimal literals; unparsable tokens are skipped.
    pub fn extract_numbers(&self, text: &str) -> Vec<f64> {
        NUMBER
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .collect()
    }

    /// Extract isolated single letters that are not common short words.
    pub fn extract_variables(&self, text: &str) -> Vec<String> {
        let mut variables: Vec<String> = Vec::new();

        for m in SINGLE_LETTER.find_iter(text) {
            let letter = m.as_str();
            if self.stopwords.contains(letter.to_lowercase().as_str()) {
                continue;
            }
            if !variables.iter().any(|v| v == letter) {
                variables.push(letter.to_string());
            }
        }

        variables
    }
}

/// Try each pattern in priority order; the first match whose cleaned text is
/// longer than `min_len` characters wins.
fn first_cleaned_match(
    patterns: &[Regex],
    filler: &Regex,
    text: &str,
    min_len: usize,
) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let cleaned = filler.replace_all(caps[1].trim(), "");
        let cleaned = cleaned.trim();
        (!cleaned.is_empty() && cleaned.chars().count() > min_len).then(|| cleaned.to_string())
    })
}
