//! Voxen core: math-question analysis and conversation routing.
//!
//! The `brain` module decides, without any model call, whether a message is
//! a math question and extracts what it can; the `actors` module routes the
//! turn to the math or general responder and records it.

pub mod actors;
pub mod brain;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod math;
pub mod rate_limiter;
pub mod router;

#[cfg(test)]
mod tests;

pub use actors::supervisor::{SupervisorHandle, TurnOutcome};
pub use config::AppConfig;
pub use error::AppError;
