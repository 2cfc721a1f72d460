//! Test Module
//!
//! Cross-module test suite for the Voxen core.
//!
//! ## Test Categories
//! - `brain_tests`: Classification, extraction, normalization and validation together
//! - `supervisor_tests`: Full turns through the supervisor against a mock LLM server
//! - `property_tests`: Confidence range, no-signal text and normalization idempotency

pub mod property_tests;
