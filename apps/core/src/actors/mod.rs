//! # Actors
//!
//! Message-passing components of the conversation core.
//!
//! - `llm`: HTTP completion client behind an mpsc handle
//! - `responders`: General and math pathways
//! - `supervisor`: Owns the history and runs turns sequentially

pub mod llm;
pub mod messages;
pub mod responders;
pub mod supervisor;
pub mod traits;
