//! Property Tests
//!
//! Invariants of the analysis pipeline that must hold for any input.

use crate::brain::{normalize, MathClassifier};
use crate::rate_limiter::RateLimiter;
use crate::router::Route;
use proptest::prelude::*;

proptest! {
    #[test]
    fn confidence_stays_in_unit_interval(text in ".{0,200}") {
        let result = MathClassifier::new().classify(&text);
        prop_assert!(result.confidence >= 0.0);
        prop_assert!(result.confidence <= 1.0);
    }

    #[test]
    fn math_type_implies_is_math(text in ".{0,200}") {
        let result = MathClassifier::new().classify(&text);
        prop_assert_eq!(result.is_math, result.math_type.is_some());
        prop_assert_eq!(result.is_math, !result.keywords.is_empty());
    }

    #[test]
    fn text_without_signals_scores_zero(text in "[bjkqwxyz ,.!?]{0,64}") {
        let result = MathClassifier::new().classify(&text);
        prop_assert_eq!(result.confidence, 0.0);
        prop_assert!(!result.is_math);
        prop_assert!(result.suggested_operations.is_empty());
    }

    #[test]
    fn normalize_is_idempotent(raw in "[a-zA-Z0-9()\\[\\]+*/ ^=×÷π√∞∫∑∏−–—.,-]{0,40}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn math_route_requires_confidence_above_threshold(
        text in ".{0,120}",
        threshold in 0.0f32..1.0,
    ) {
        let result = MathClassifier::new().classify(&text);
        if Route::select(&result, threshold) == Route::Math {
            prop_assert!(result.is_math);
            prop_assert!(result.confidence > threshold);
        }
    }

    #[test]
    fn burst_admits_at_most_limit(limit in 1usize..20, attempts in 0usize..40) {
        let mut limiter = RateLimiter::per_minute(limit);
        let admitted = (0..attempts).filter(|_| limiter.check("session")).count();
        prop_assert_eq!(admitted, attempts.min(limit));
    }
}
