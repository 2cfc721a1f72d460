//! Expression validation and correction hints.
//!
//! Only delimiter imbalance makes an expression invalid. Everything else is
//! reported as an advisory warning.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Operator characters accepted without an "unusual character" warning.
const ALLOWED_OPERATORS: &[char] = &['+', '-', '*', '/', '^'];

/// Punctuation accepted without an "unusual character" warning.
const ALLOWED_PUNCTUATION: &[char] = &['(', ')', '[', ']', '.', ','];

static CONSECUTIVE_OPERATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[+\-*/^]{2,}").expect("Invalid regex: consecutive operators")
});

static DIVISION_BY_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s*0").expect("Invalid regex: division by zero"));

static DIGIT_SPACE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\s+[a-zA-Z]").expect("Invalid regex: digit space letter"));

static LETTER_SPACE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]\s+\d").expect("Invalid regex: letter space digit"));

/// Outcome of a structural check on an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False only when a delimiter is unbalanced
    pub is_valid: bool,
    /// Structural errors, in check order
    pub errors: Vec<String>,
    /// Advisory warnings, in check order
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
        }
    }

    fn error(&mut self, message: &str) {
        self.is_valid = false;
        self.errors.push(message.to_string());
    }
}

/// Structural validator for math expressions
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionValidator;

impl ExpressionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check delimiter balance and flag suspicious operator use or characters.
    pub fn validate(&self, expression: &str) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if !is_balanced(expression, '(', ')') {
            result.error("Unbalanced parentheses");
        }
        if !is_balanced(expression, '[', ']') {
            result.error("Unbalanced brackets");
        }

        if CONSECUTIVE_OPERATORS.is_match(expression) {
            result
                .warnings
                .push("Consecutive operators detected".to_string());
        }
        if DIVISION_BY_ZERO.is_match(expression) {
            result.warnings.push("Potential division by zero".to_string());
        }

        let unusual: BTreeSet<char> = expression.chars().filter(|c| !is_allowed(*c)).collect();
        if !unusual.is_empty() {
            let listed = unusual
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            result
                .warnings
                .push(format!("Unusual characters detected: {}", listed));
        }

        result
    }

    /// Heuristic hints about likely mistakes. Computed independently of `validate`.
    pub fn suggest_corrections(&self, expression: &str) -> Vec<String> {
        let mut suggestions = Vec::new();

        if expression.contains('=') && !expression.contains(['<', '>']) {
            suggestions.push("Consider using '==' for equality comparison".to_string());
        }

        if DIGIT_SPACE_LETTER.is_match(expression) || LETTER_SPACE_DIGIT.is_match(expression) {
            suggestions.push("Consider adding '*' for implicit multiplication".to_string());
        }

        if !is_balanced(expression, '(', ')') {
            suggestions.push("Check for balanced parentheses".to_string());
        }

        suggestions
    }
}

/// Count-based balance check: the number of openers equals the number of closers.
fn is_balanced(expression: &str, open: char, close: char) -> bool {
    expression.matches(open).count() == expression.matches(close).count()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || ALLOWED_OPERATORS.contains(&c)
        || ALLOWED_PUNCTUATION.contains(&c)
}
