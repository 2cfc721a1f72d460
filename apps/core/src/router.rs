//! Route selection between the math and general responders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::brain::ClassificationResult;

/// Confidence reported for every general-route reply
pub const GENERAL_ROUTE_CONFIDENCE: f32 = 0.8;

/// Confidence reported when the responder failed
pub const ERROR_CONFIDENCE: f32 = 0.0;

/// Prefix of the reply recorded when a responder fails
pub const APOLOGY_PREFIX: &str = "I apologize, but I encountered an error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Math,
    General,
}

impl Route {
    /// Math only when the classifier saw a math keyword and the confidence
    /// is strictly above `threshold`.
    pub fn select(classification: &ClassificationResult, threshold: f32) -> Self {
        if classification.is_math && classification.confidence > threshold {
            Route::Math
        } else {
            Route::General
        }
    }

    /// Confidence to report for a successful reply on this route.
    pub fn reported_confidence(self, classification: &ClassificationResult) -> f32 {
        match self {
            Route::Math => classification.confidence,
            Route::General => GENERAL_ROUTE_CONFIDENCE,
        }
    }

    /// Value of the `response_type` metadata field.
    pub fn response_type(self) -> &'static str {
        match self {
            Route::Math => "math_response",
            Route::General => "ai_response",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Math => write!(f, "math"),
            Route::General => write!(f, "general"),
        }
    }
}

/// Reply text recorded in place of a failed response.
pub fn apology(error: &impl fmt::Display) -> String {
    format!("{}: {}", APOLOGY_PREFIX, error)
}
