use tokio::sync::oneshot;

use crate::actors::supervisor::TurnOutcome;
use crate::conversation::{ConversationMessage, ConversationSummary, ExportFormat};

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request to generate a complete text response.
    Generate {
        prompt: String,
        system_prompt: Option<String>,
        /// Overrides the configured temperature.
        temperature: Option<f32>,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// One conversation turn from a session.
    ProcessUserMessage {
        session_id: String,
        content: String,
        responder: oneshot::Sender<Result<TurnOutcome, AppError>>,
    },
    /// The last `count` recorded messages.
    GetHistory {
        count: usize,
        responder: oneshot::Sender<Vec<ConversationMessage>>,
    },
    /// Messages whose content contains `query`.
    SearchHistory {
        query: String,
        responder: oneshot::Sender<Vec<ConversationMessage>>,
    },
    ClearHistory {
        responder: oneshot::Sender<()>,
    },
    Summarize {
        responder: oneshot::Sender<ConversationSummary>,
    },
    Export {
        format: ExportFormat,
        responder: oneshot::Sender<Result<String, AppError>>,
    },
    /// Stop the message loop.
    Shutdown,
}
