//! Math-question classification.
//!
//! Keyword taxonomy matching plus a few regex signals, folded into an
//! additive confidence score. No ML model required - pure Rust regex matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::taxonomy::{MathCategory, MathOperation};

/// Contribution of one matched keyword, in tenths.
const KEYWORD_WEIGHT: u32 = 2;

/// Confidence ceiling, in tenths.
const MAX_CONFIDENCE: u32 = 10;

/// Result of math-question classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether any taxonomy keyword matched
    pub is_math: bool,
    /// Last category whose keyword matched
    pub math_type: Option<MathCategory>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Keywords that matched
    pub keywords: BTreeSet<String>,
    /// Operations suggested for `math_type`
    pub suggested_operations: Vec<MathOperation>,
}

impl ClassificationResult {
    /// A classification with no math signal at all.
    pub fn not_math() -> Self {
        Self {
            is_math: false,
            math_type: None,
            confidence: 0.0,
            keywords: BTreeSet::new(),
            suggested_operations: vec![],
        }
    }

    /// Topic label for logs and prompts.
    pub fn topic(&self) -> &'static str {
        self.math_type.map_or("general", |category| category.label())
    }
}

/// A pattern that adds a fixed weight once, however often it occurs
struct SignalRule {
    pattern: Regex,
    weight: u32,
}

static SIGNAL_RULES: LazyLock<Vec<SignalRule>> = LazyLock::new(|| {
    vec![
        // Any digit
        SignalRule {
            pattern: Regex::new(r"\d").expect("Invalid regex: digit signal"),
            weight: 1,
        },
        // Arithmetic or comparison operator
        SignalRule {
            pattern: Regex::new(r"[+\-*/^=<>]").expect("Invalid regex: operator signal"),
            weight: 2,
        },
        // Inline algebra such as "x + 1"
        SignalRule {
            pattern: Regex::new(r"[a-zA-Z]\s*[+\-*/]\s*[a-zA-Z0-9]")
                .expect("Invalid regex: inline expression signal"),
            weight: 3,
        },
    ]
});

/// Running totals while folding over the rules
#[derive(Default)]
struct Tally {
    math_type: Option<MathCategory>,
    weight: u32,
    keywords: BTreeSet<String>,
}

/// Classifier deciding whether a message is a math question
#[derive(Debug, Default, Clone, Copy)]
pub struct MathClassifier;

impl MathClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message.
    ///
    /// Every keyword hit adds 0.2 and overwrites `math_type`, so the category
    /// reported is the last one in taxonomy order that matched, not the one
    /// with the most hits.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lowered = text.to_lowercase();

        let tally = MathCategory::ALL
            .iter()
            .flat_map(|category| {
                category
                    .keywords()
                    .iter()
                    .map(move |keyword| (*category, *keyword))
            })
            .filter(|(_, keyword)| lowered.contains(keyword))
            .fold(Tally::default(), |mut tally, (category, keyword)| {
                tally.math_type = Some(category);
                tally.weight += KEYWORD_WEIGHT;
                tally.keywords.insert(keyword.to_string());
                tally
            });

        let tally = SIGNAL_RULES
            .iter()
            .filter(|rule| rule.pattern.is_match(text))
            .fold(tally, |mut tally, rule| {
                tally.weight += rule.weight;
                tally
            });

        let confidence = tally.weight.min(MAX_CONFIDENCE) as f32 / 10.0;

        ClassificationResult {
            is_math: tally.math_type.is_some(),
            math_type: tally.math_type,
            confidence,
            keywords: tally.keywords,
            suggested_operations: tally
                .math_type
                .map(|category| category.suggested_operations().to_vec())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_math() {
        let result = MathClassifier::new().classify("Tell me a joke");
        assert_eq!(result, ClassificationResult::not_math());
    }

    #[test]
    fn test_solve_equation() {
        let result = MathClassifier::new().classify("solve 2x + 5 = 13");

        assert!(result.is_math);
        assert_eq!(result.math_type, Some(MathCategory::Algebra));
        assert!(result.keywords.contains("solve"));
        // keyword 0.2 + digit 0.1 + operator 0.2 + inline expression 0.3
        assert!((result.confidence - 0.8).abs() < 1e-6);
        assert_eq!(
            result.suggested_operations,
            vec![MathOperation::SolveEquation, MathOperation::EvaluateExpression]
        );
    }

    #[test]
    fn test_last_category_wins() {
        let result = MathClassifier::new().classify("derivative of the area of a circle");

        assert_eq!(result.math_type, Some(MathCategory::Geometry));
        assert_eq!(result.keywords.len(), 3);
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert_eq!(
            result.suggested_operations,
            vec![MathOperation::CalculateGeometry]
        );
    }

    #[test]
    fn test_substring_matching_quirks() {
        // "standard" contains "tan": trigonometry is scanned after statistics
        let result = MathClassifier::new().classify("what is the standard deviation");
        assert_eq!(result.math_type, Some(MathCategory::Trigonometry));
        assert!(result.suggested_operations.is_empty());

        // "factor" is in two categories and counts twice
        let result = MathClassifier::new().classify("factor this");
        assert_eq!(result.math_type, Some(MathCategory::NumberTheory));
        assert!((result.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_signals_without_keywords() {
        let result = MathClassifier::new().classify("2+2");

        assert!(!result.is_math);
        assert_eq!(result.math_type, None);
        assert!((result.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_signals_apply_once() {
        let once = MathClassifier::new().classify("x + 1");
        let many = MathClassifier::new().classify("x + 1 + y + 2 + z + 3");
        assert_eq!(once.confidence, many.confidence);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let result = MathClassifier::new()
            .classify("solve the equation for the area and volume of a sphere: x + 2 = 5");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_topic_label() {
        let classifier = MathClassifier::new();
        assert_eq!(classifier.classify("hello").topic(), "general");
        assert_eq!(classifier.classify("find the mean").topic(), "statistics");
    }
}
