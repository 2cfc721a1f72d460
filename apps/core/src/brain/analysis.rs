//! Math Analysis - Output structure for Brain analysis.
//!
//! Contains everything the analyzer extracted from one user message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::ClassificationResult;
use super::extractor::ExtractedExpression;
use super::validator::ValidationResult;

/// Complete analysis of a single user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathAnalysis {
    /// Original user query
    pub query: String,

    /// Math-question verdict
    pub classification: ClassificationResult,

    /// Every fragment the extraction rules found
    pub expressions: Vec<ExtractedExpression>,

    /// First equation-like fragment, filler verbs removed
    pub equation: Option<String>,

    /// Function definition or calculus target
    pub function: Option<String>,

    /// Numeric literals in the query
    pub numbers: Vec<f64>,

    /// Isolated single-letter variables
    pub variables: Vec<String>,

    /// The fragment chosen for normalization (equation first, then function)
    pub target: Option<String>,

    /// `target` in evaluator-ready form
    pub normalized: Option<String>,

    /// `normalized` rendered as LaTeX
    pub latex: Option<String>,

    /// Structural check of `target`
    pub validation: Option<ValidationResult>,

    /// Correction hints for `target`
    pub suggestions: Vec<String>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,

    /// Timestamp of analysis
    pub timestamp: DateTime<Utc>,
}

impl MathAnalysis {
    /// Create an empty analysis for a query
    pub fn new(query: String) -> Self {
        Self {
            query,
            classification: ClassificationResult::not_math(),
            expressions: vec![],
            equation: None,
            function: None,
            numbers: vec![],
            variables: vec![],
            target: None,
            normalized: None,
            latex: None,
            validation: None,
            suggestions: vec![],
            processing_time_ms: 0,
            timestamp: Utc::now(),
        }
    }

    /// Validation warnings and errors, flattened. Empty when nothing was validated.
    pub fn issues(&self) -> Vec<String> {
        self.validation
            .as_ref()
            .map(|v| v.errors.iter().chain(v.warnings.iter()).cloned().collect())
            .unwrap_or_default()
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Math: {} ({:.0}%), Topic: {}, Expressions: {}, Target: {}, Valid: {}",
            self.classification.is_math,
            self.classification.confidence * 100.0,
            self.classification.topic(),
            self.expressions.len(),
            self.normalized.as_deref().unwrap_or("-"),
            self.validation
                .as_ref()
                .map_or("n/a", |v| if v.is_valid { "yes" } else { "no" })
        )
    }
}
