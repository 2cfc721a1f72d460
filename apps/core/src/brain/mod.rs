//! # Brain Module
//!
//! Fast, non-LLM analysis system for Voxen.
//! Analyzes user input BEFORE routing it to a responder.
//!
//! ## Components
//! - `normalizer`: Informal notation to evaluator-ready form
//! - `extractor`: Equations, functions, numbers and variables from free text
//! - `validator`: Structural checks and correction hints
//! - `taxonomy`: Fixed category/keyword table
//! - `classifier`: Math-question classification
//! - `analysis`: Output data structure
//! - `analyzer`: Main orchestrator
//! - `text`: Response cleanup helpers

pub mod analysis;
pub mod analyzer;
pub mod classifier;
pub mod extractor;
pub mod normalizer;
pub mod taxonomy;
pub mod text;
pub mod validator;

// Re-export main types for convenience
pub use analysis::MathAnalysis;
pub use analyzer::MathAnalyzer;
pub use classifier::{ClassificationResult, MathClassifier};
pub use extractor::{ExpressionExtractor, ExtractedExpression};
pub use normalizer::{normalize, to_latex};
pub use taxonomy::{MathCategory, MathOperation};
pub use text::TextProcessor;
pub use validator::{ExpressionValidator, ValidationResult};
