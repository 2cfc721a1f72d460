//! Math topic taxonomy.
//!
//! Fixed mapping from category to trigger keywords, and from category to the
//! downstream operations worth suggesting. Iteration order is significant:
//! the classifier keeps the last category that matched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Math topic category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathCategory {
    Algebra,
    Calculus,
    Geometry,
    Statistics,
    Trigonometry,
    LinearAlgebra,
    NumberTheory,
}

/// Operation the math pathway may run for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOperation {
    SolveEquation,
    EvaluateExpression,
    CalculateDerivative,
    CalculateIntegral,
    CalculateGeometry,
    CalculateStatistics,
    CalculateProbability,
}

impl fmt::Display for MathCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for MathOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl MathCategory {
    /// All categories, in scan order.
    pub const ALL: [MathCategory; 7] = [
        MathCategory::Algebra,
        MathCategory::Calculus,
        MathCategory::Geometry,
        MathCategory::Statistics,
        MathCategory::Trigonometry,
        MathCategory::LinearAlgebra,
        MathCategory::NumberTheory,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MathCategory::Algebra => "algebra",
            MathCategory::Calculus => "calculus",
            MathCategory::Geometry => "geometry",
            MathCategory::Statistics => "statistics",
            MathCategory::Trigonometry => "trigonometry",
            MathCategory::LinearAlgebra => "linear_algebra",
            MathCategory::NumberTheory => "number_theory",
        }
    }

    /// Lower-case trigger keywords, matched as substrings.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            MathCategory::Algebra => &[
                "equation",
                "solve",
                "variable",
                "polynomial",
                "factor",
                "expand",
            ],
            MathCategory::Calculus => &[
                "derivative",
                "integral",
                "limit",
                "differentiate",
                "integrate",
                "d/dx",
                "∫",
            ],
            MathCategory::Geometry => &[
                "area",
                "volume",
                "perimeter",
                "circle",
                "triangle",
                "rectangle",
                "sphere",
            ],
            MathCategory::Statistics => &[
                "mean",
                "median",
                "mode",
                "standard deviation",
                "probability",
                "distribution",
            ],
            MathCategory::Trigonometry => &["sin", "cos", "tan", "angle", "degree", "radian"],
            MathCategory::LinearAlgebra => &[
                "matrix",
                "vector",
                "eigenvalue",
                "determinant",
                "inverse",
            ],
            MathCategory::NumberTheory => &["prime", "factor", "divisible", "modulo", "gcd", "lcm"],
        }
    }

    /// Suggested operations. Not every category has any.
    pub fn suggested_operations(&self) -> &'static [MathOperation] {
        match self {
            MathCategory::Algebra => &[
                MathOperation::SolveEquation,
                MathOperation::EvaluateExpression,
            ],
            MathCategory::Calculus => &[
                MathOperation::CalculateDerivative,
                MathOperation::CalculateIntegral,
            ],
            MathCategory::Geometry => &[MathOperation::CalculateGeometry],
            MathCategory::Statistics => &[
                MathOperation::CalculateStatistics,
                MathOperation::CalculateProbability,
            ],
            MathCategory::Trigonometry | MathCategory::LinearAlgebra | MathCategory::NumberTheory => {
                &[]
            }
        }
    }
}

impl MathOperation {
    pub fn label(&self) -> &'static str {
        match self {
            MathOperation::SolveEquation => "solve_equation",
            MathOperation::EvaluateExpression => "evaluate_expression",
            MathOperation::CalculateDerivative => "calculate_derivative",
            MathOperation::CalculateIntegral => "calculate_integral",
            MathOperation::CalculateGeometry => "calculate_geometry",
            MathOperation::CalculateStatistics => "calculate_statistics",
            MathOperation::CalculateProbability => "calculate_probability",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_serde() {
        for category in MathCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
        let json = serde_json::to_string(&MathOperation::SolveEquation).unwrap();
        assert_eq!(json, "\"solve_equation\"");
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for category in MathCategory::ALL {
            for keyword in category.keywords() {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }
}
