//! # Math Module
//!
//! Numeric evaluation and equation solving over normalized expressions.
//!
//! ## Components
//! - `evaluator`: Tokenizer, parser and expression tree
//! - `processor`: `SymbolicEvaluator` implementation driven by `MathConfig`

pub mod evaluator;
pub mod processor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use evaluator::{parse, Expr};
pub use processor::MathProcessor;

/// Errors raised while parsing, evaluating or solving an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("No equals sign found in equation")]
    MissingEquals,

    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Unsupported function: {0}")]
    UnsupportedFunction(String),

    #[error("Cannot evaluate: unknown variable '{0}'")]
    UnboundVariable(String),

    #[error("Cannot solve for several unknowns: {0}")]
    TooManyUnknowns(String),

    #[error("Result is not a finite number")]
    NonFinite,

    #[error("No solution found within {0} iterations")]
    NoConvergence(u32),
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    /// Fully numeric, formatted to the configured precision
    Value(String),
    /// Contains unknowns; canonical rendering of the expression
    Symbolic(String),
}

/// Result of solving an equation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// The unknown solved for. `None` when the equation has no unknowns.
    pub unknown: Option<String>,
    /// Real solutions, ascending, formatted to the configured precision
    pub solutions: Vec<String>,
}

impl SolveOutcome {
    /// Human-readable answer, or `None` when there is nothing to report.
    pub fn answer(&self) -> Option<String> {
        let unknown = self.unknown.as_deref()?;
        match self.solutions.as_slice() {
            [] => None,
            [single] => Some(format!("{} = {}", unknown, single)),
            many => Some(format!("{} = {}", unknown, many.join(", "))),
        }
    }
}

/// Collaborator that evaluates and solves normalized expressions.
pub trait SymbolicEvaluator: Send + Sync + 'static {
    /// Evaluate an expression. Unknowns yield a symbolic outcome.
    fn evaluate(&self, expression: &str) -> Result<EvaluationOutcome, EvalError>;

    /// Solve `left = right` for its single unknown.
    fn solve(&self, equation: &str) -> Result<SolveOutcome, EvalError>;
}

/// Format a number with at most `precision` decimals, trailing zeros removed.
pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "oo".to_string() } else { "-oo".to_string() };
    }

    let mut formatted = format!("{:.*}", precision, value);
    if formatted.contains('.') {
        let trimmed_len = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed_len);
    }
    if formatted == "-0" {
        formatted = "0".to_string();
    }
    formatted
}
