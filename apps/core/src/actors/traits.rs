use crate::actors::messages::AppError;
use crate::brain::MathAnalysis;
use crate::conversation::ConversationMessage;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the specific implementation of the LLM, allowing for different
/// backends (e.g., local llama.cpp, remote API) to be used interchangeably.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Generates a complete text response based on a prompt and optional parameters.
    async fn generate_with_params(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError>;
}

/// Open-ended conversation pathway.
#[async_trait]
pub trait GeneralResponder: Send + Sync + 'static {
    /// Reply to `prompt` given the turns recorded before it, oldest first.
    async fn respond(
        &self,
        prompt: &str,
        recent_history: &[ConversationMessage],
    ) -> Result<String, AppError>;
}

/// Math pathway, fed with the analyzer's view of the message.
#[async_trait]
pub trait MathResponder: Send + Sync + 'static {
    async fn respond(&self, input: &str, analysis: &MathAnalysis) -> Result<String, AppError>;
}
