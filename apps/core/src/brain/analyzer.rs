//! Math Analyzer - Main orchestrator for the Brain module.
//!
//! Runs classification, extraction, normalization and validation over one
//! user message and gathers the results into a [`MathAnalysis`].

use chrono::Utc;
use std::time::Instant;
use tracing::debug;

use super::analysis::MathAnalysis;
use super::classifier::MathClassifier;
use super::extractor::ExpressionExtractor;
use super::normalizer::{normalize, to_latex};
use super::validator::ExpressionValidator;

/// Main analyzer that orchestrates all analysis components
#[derive(Default)]
pub struct MathAnalyzer {
    classifier: MathClassifier,
    extractor: ExpressionExtractor,
    validator: ExpressionValidator,
}

impl MathAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a query and produce a math analysis
    pub fn analyze(&self, query: &str) -> MathAnalysis {
        let start = Instant::now();
        let mut analysis = MathAnalysis::new(query.to_string());

        // 1. Independent extraction passes
        analysis.expressions = self.extractor.extract_tagged(query);
        analysis.equation = self.extractor.extract_equation(query);
        analysis.function = self.extractor.extract_function(query);
        analysis.numbers = self.extractor.extract_numbers(query);
        analysis.variables = self.extractor.extract_variables(query);

        // 2. Classification aggregates keyword and pattern signals
        analysis.classification = self.classifier.classify(query);

        // 3. Normalize and check the target, but only when there is some math
        //    signal: the function catch-all matches almost any text.
        if analysis.classification.confidence > 0.0 {
            analysis.target = analysis.equation.clone().or_else(|| analysis.function.clone());
        }
        if let Some(target) = &analysis.target {
            let normalized = normalize(target);
            analysis.latex = Some(to_latex(&normalized));
            analysis.normalized = Some(normalized);
            analysis.validation = Some(self.validator.validate(target));
            analysis.suggestions = self.validator.suggest_corrections(target);
        }

        analysis.processing_time_ms = start.elapsed().as_millis() as u64;
        analysis.timestamp = Utc::now();

        debug!("Analysis: {}", analysis.summary());
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::taxonomy::MathCategory;

    #[test]
    fn test_equation_analysis() {
        let analyzer = MathAnalyzer::new();

        let analysis = analyzer.analyze("solve 2x + 5 = 13");

        assert!(analysis.classification.is_math);
        assert_eq!(analysis.classification.math_type, Some(MathCategory::Algebra));
        assert_eq!(analysis.target.as_deref(), Some("2x + 5 = 13"));
        assert_eq!(analysis.normalized.as_deref(), Some("2*x + 5 = 13"));
        let validation = analysis.validation.as_ref().unwrap();
        assert!(validation.is_valid);
        assert_eq!(validation.warnings, vec!["Unusual characters detected: =".to_string()]);
        assert_eq!(analysis.numbers, vec![2.0, 5.0, 13.0]);
    }

    #[test]
    fn test_function_analysis() {
        let analyzer = MathAnalyzer::new();

        let analysis = analyzer.analyze("What is the derivative of x^2?");

        assert_eq!(analysis.classification.math_type, Some(MathCategory::Calculus));
        assert_eq!(analysis.equation, None);
        assert_eq!(analysis.target.as_deref(), Some("x^2"));
        assert_eq!(analysis.normalized.as_deref(), Some("x**2"));
        assert_eq!(analysis.latex.as_deref(), Some("$x^2$"));
    }

    #[test]
    fn test_plain_chat_has_no_target() {
        let analyzer = MathAnalyzer::new();

        let analysis = analyzer.analyze("Tell me a joke");

        assert!(!analysis.classification.is_math);
        assert!(analysis.function.is_some());
        assert!(analysis.target.is_none());
        assert!(analysis.validation.is_none());
    }

    #[test]
    fn test_invalid_target_is_reported() {
        let analyzer = MathAnalyzer::new();

        let analysis = analyzer.analyze("solve x + (1 = 2");

        assert_eq!(analysis.target.as_deref(), Some("x + (1 = 2"));
        let validation = analysis.validation.unwrap();
        assert!(!validation.is_valid);
        assert!(analysis
            .suggestions
            .contains(&"Check for balanced parentheses".to_string()));
    }
}
