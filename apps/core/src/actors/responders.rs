//! The two conversation pathways.
//!
//! `ChatResponder` handles open-ended conversation; `MathPathResponder`
//! tries the evaluator first and only falls back to the LLM when there is
//! no numeric answer.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::actors::messages::AppError;
use crate::actors::traits::{GeneralResponder, LlmActor, MathResponder};
use crate::brain::MathAnalysis;
use crate::conversation::{context_prompt, ConversationMessage};
use crate::math::{EvaluationOutcome, SymbolicEvaluator};

/// Reply used when the model produced nothing usable
pub const FALLBACK_REPLY: &str = "I understand. Please continue.";

/// General conversation backed by the LLM.
pub struct ChatResponder<L: LlmActor> {
    llm: Arc<L>,
    system_prompt: String,
}

impl<L: LlmActor> ChatResponder<L> {
    pub fn new(llm: Arc<L>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    fn build_prompt(&self, prompt: &str, recent_history: &[ConversationMessage]) -> String {
        format!(
            "{}User: {}\nAssistant:",
            context_prompt(&self.system_prompt, recent_history),
            prompt
        )
    }
}

#[async_trait]
impl<L: LlmActor> GeneralResponder for ChatResponder<L> {
    #[instrument(skip_all, fields(history = recent_history.len()))]
    async fn respond(
        &self,
        prompt: &str,
        recent_history: &[ConversationMessage],
    ) -> Result<String, AppError> {
        let full_prompt = self.build_prompt(prompt, recent_history);
        let raw = self.llm.generate_with_params(full_prompt, None, None).await?;

        // Completion models keep talking as the next speaker; keep the first line
        let reply = raw
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(FALLBACK_REPLY);
        Ok(reply.to_string())
    }
}

/// Math pathway: evaluator first, LLM explanation as fallback.
pub struct MathPathResponder<L: LlmActor, E: SymbolicEvaluator> {
    llm: Arc<L>,
    evaluator: Arc<E>,
    system_prompt: String,
}

impl<L: LlmActor, E: SymbolicEvaluator> MathPathResponder<L, E> {
    pub fn new(llm: Arc<L>, evaluator: Arc<E>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            evaluator,
            system_prompt: system_prompt.into(),
        }
    }

    /// A direct answer when the normalized target solves or evaluates to numbers.
    fn direct_answer(&self, analysis: &MathAnalysis) -> Option<String> {
        let normalized = analysis.normalized.as_deref()?;

        if analysis.equation.is_some() {
            return match self.evaluator.solve(normalized) {
                Ok(outcome) => outcome.answer(),
                Err(e) => {
                    debug!("Evaluator could not solve '{}': {}", normalized, e);
                    None
                }
            };
        }

        match self.evaluator.evaluate(normalized) {
            Ok(EvaluationOutcome::Value(value)) => Some(format!("{} = {}", normalized, value)),
            Ok(EvaluationOutcome::Symbolic(_)) => None,
            Err(e) => {
                debug!("Evaluator could not evaluate '{}': {}", normalized, e);
                None
            }
        }
    }

    fn build_prompt(&self, input: &str, analysis: &MathAnalysis) -> String {
        let mut sections = vec![
            self.system_prompt.clone(),
            format!("Topic: {}", analysis.classification.topic()),
        ];
        if let Some(normalized) = &analysis.normalized {
            sections.push(format!("Expression: {}", normalized));
        }
        let issues = analysis.issues();
        if !issues.is_empty() {
            sections.push(format!("Warnings: {}", issues.join("; ")));
        }
        if !analysis.suggestions.is_empty() {
            sections.push(format!("Suggestions: {}", analysis.suggestions.join("; ")));
        }
        sections.push(format!("User: {}\nAssistant:", input));
        sections.join("\n\n")
    }
}

#[async_trait]
impl<L: LlmActor, E: SymbolicEvaluator> MathResponder for MathPathResponder<L, E> {
    #[instrument(skip_all, fields(topic = analysis.classification.topic()))]
    async fn respond(&self, input: &str, analysis: &MathAnalysis) -> Result<String, AppError> {
        if let Some(answer) = self.direct_answer(analysis) {
            info!("Answered by evaluator: {}", answer);
            return Ok(answer);
        }

        let prompt = self.build_prompt(input, analysis);
        let raw = self.llm.generate_with_params(prompt, None, None).await?;
        let reply = raw.trim();
        if reply.is_empty() {
            Ok(FALLBACK_REPLY.to_string())
        } else {
            Ok(reply.to_string())
        }
    }
}
