use crate::actors::llm::LlmActorHandle;
use crate::actors::messages::{AppError, SupervisorMessage};
use crate::actors::responders::{ChatResponder, MathPathResponder};
use crate::actors::traits::{GeneralResponder, MathResponder};
use crate::brain::{ClassificationResult, MathAnalysis, MathAnalyzer, TextProcessor};
use crate::config::AppConfig;
use crate::conversation::{
    ConversationHistory, ConversationMessage, ConversationSummary, ExportFormat, Role,
};
use crate::math::MathProcessor;
use crate::rate_limiter::RateLimiter;
use crate::router::{apology, Route, ERROR_CONFIDENCE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument, warn};

/// Bookkeeping requests never wait on the LLM
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Extra time a turn may take beyond the LLM request timeout
const TURN_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// What happened during one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub route: Route,
    /// Cleaned reply, or the apology when the responder failed
    pub response: String,
    pub confidence: f32,
    pub classification: ClassificationResult,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for all business logic in the application. It owns
/// the conversation history and routes each turn to the general or math responder.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    turn_timeout: Duration,
}

impl SupervisorHandle {
    /// Creates a supervisor wired to the HTTP LLM and the numeric evaluator.
    pub fn new(config: &AppConfig) -> Self {
        let llm = Arc::new(LlmActorHandle::new(&config.model));
        let evaluator = Arc::new(MathProcessor::new(&config.math));

        let general = Arc::new(ChatResponder::new(llm.clone(), config.chat.system_prompt.clone()));
        let math = Arc::new(MathPathResponder::new(
            llm,
            evaluator,
            config.chat.math_system_prompt.clone(),
        ));

        Self::with_responders(config, general, math)
    }

    /// Creates a supervisor with the given responders and returns a handle.
    ///
    /// This is the main constructor; it spawns the runner in a new Tokio task.
    pub fn with_responders<G, M>(config: &AppConfig, general: Arc<G>, math: Arc<M>) -> Self
    where
        G: GeneralResponder,
        M: MathResponder,
    {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner::new(receiver, config, general, math);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            turn_timeout: Duration::from_secs(config.model.request_timeout_secs) + TURN_TIMEOUT_MARGIN,
        }
    }

    async fn request<T>(
        &self,
        msg: SupervisorMessage,
        recv: oneshot::Receiver<T>,
        wait: Duration,
    ) -> Result<T, AppError> {
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(wait, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))
    }

    /// Processes one user message from a session.
    ///
    /// Responder failures do not surface here: they are recorded as an apology
    /// and reported through `TurnOutcome::error`. Only rate limiting and actor
    /// failures return `Err`.
    #[instrument(skip(self, content))]
    pub async fn process_message(
        &self,
        session_id: String,
        content: String,
    ) -> Result<TurnOutcome, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ProcessUserMessage {
            session_id,
            content,
            responder: send,
        };
        self.request(msg, recv, self.turn_timeout).await?
    }

    /// The last `count` messages, oldest first.
    pub async fn history(&self, count: usize) -> Result<Vec<ConversationMessage>, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::GetHistory {
            count,
            responder: send,
        };
        self.request(msg, recv, QUERY_TIMEOUT).await
    }

    pub async fn search(&self, query: String) -> Result<Vec<ConversationMessage>, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::SearchHistory {
            query,
            responder: send,
        };
        self.request(msg, recv, QUERY_TIMEOUT).await
    }

    pub async fn clear_history(&self) -> Result<(), AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::ClearHistory { responder: send };
        self.request(msg, recv, QUERY_TIMEOUT).await
    }

    pub async fn summary(&self) -> Result<ConversationSummary, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::Summarize { responder: send };
        self.request(msg, recv, QUERY_TIMEOUT).await
    }

    pub async fn export(&self, format: ExportFormat) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::Export {
            format,
            responder: send,
        };
        self.request(msg, recv, QUERY_TIMEOUT).await?
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))
    }
}

// --- Actor Runner ---
struct SupervisorRunner<G, M>
where
    G: GeneralResponder,
    M: MathResponder,
{
    receiver: mpsc::Receiver<SupervisorMessage>,
    general: Arc<G>,
    math: Arc<M>,
    analyzer: MathAnalyzer,
    text: TextProcessor,
    history: ConversationHistory,
    rate_limiter: RateLimiter,
    math_threshold: f32,
    context_messages: usize,
}

impl<G, M> SupervisorRunner<G, M>
where
    G: GeneralResponder,
    M: MathResponder,
{
    fn new(
        receiver: mpsc::Receiver<SupervisorMessage>,
        config: &AppConfig,
        general: Arc<G>,
        math: Arc<M>,
    ) -> Self {
        Self {
            receiver,
            general,
            math,
            analyzer: MathAnalyzer::new(),
            text: TextProcessor::new(
                config.chat.max_response_length,
                config.chat.sensitive_words.clone(),
            ),
            history: ConversationHistory::new(config.chat.max_history),
            rate_limiter: RateLimiter::per_minute(config.chat.rate_limit_per_minute),
            math_threshold: config.chat.math_threshold,
            context_messages: config.chat.context_messages,
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            if matches!(msg, SupervisorMessage::Shutdown) {
                info!("Supervisor shutting down...");
                break;
            }
            self.handle_message(msg).await;
        }
        info!("Supervisor stopped");
    }

    async fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::ProcessUserMessage {
                session_id,
                content,
                responder,
            } => {
                let result = self.handle_turn(session_id, content).await;
                if let Err(e) = &result {
                    warn!("Turn rejected: {}", e);
                }
                let _ = responder.send(result);
            }
            SupervisorMessage::GetHistory { count, responder } => {
                let _ = responder.send(self.history.recent(count));
            }
            SupervisorMessage::SearchHistory { query, responder } => {
                let _ = responder.send(self.history.search(&query));
            }
            SupervisorMessage::ClearHistory { responder } => {
                self.history.clear();
                info!("Conversation history cleared");
                let _ = responder.send(());
            }
            SupervisorMessage::Summarize { responder } => {
                let _ = responder.send(self.history.summary());
            }
            SupervisorMessage::Export { format, responder } => {
                let _ = responder.send(self.history.export(format));
            }
            SupervisorMessage::Shutdown => {}
        }
    }

    #[instrument(skip(self, content))]
    async fn handle_turn(
        &mut self,
        session_id: String,
        content: String,
    ) -> Result<TurnOutcome, AppError> {
        if !self.rate_limiter.check(&session_id) {
            return Err(AppError::RateLimited);
        }

        // --- Analysis & Routing ---
        let analysis = self.analyzer.analyze(&content);
        let route = Route::select(&analysis.classification, self.math_threshold);
        info!("Routing to {} ({})", route, analysis.summary());

        // --- Record the user turn ---
        let recent = self.history.recent(self.context_messages);
        let sensitive = self.text.contains_sensitive(&content);
        let keywords = self.text.extract_keywords(&content);
        let user_metadata = user_metadata(&session_id, &analysis, keywords, sensitive)?;
        self.history.append(ConversationMessage::new(
            Role::User,
            content.clone(),
            user_metadata,
        ));

        // --- Respond ---
        let result = match route {
            Route::Math => self.math.respond(&content, &analysis).await,
            Route::General => self.general.respond(&content, &recent).await,
        };

        let (response, confidence, error) = match result {
            Ok(text) => (
                self.text.clean_response(&text),
                route.reported_confidence(&analysis.classification),
                None,
            ),
            Err(e) => {
                error!("Responder failed on {} route: {}", route, e);
                (apology(&e), ERROR_CONFIDENCE, Some(e.to_string()))
            }
        };

        let mut metadata = Map::new();
        metadata.insert("route".to_string(), Value::String(route.to_string()));
        metadata.insert("confidence".to_string(), serde_json::to_value(confidence)?);
        let response_type = if error.is_some() {
            "error"
        } else {
            route.response_type()
        };
        metadata.insert("response_type".to_string(), Value::String(response_type.to_string()));
        if let Some(e) = &error {
            metadata.insert("error".to_string(), Value::String(e.clone()));
        }
        self.history.append(ConversationMessage::new(
            Role::Assistant,
            response.clone(),
            metadata,
        ));

        Ok(TurnOutcome {
            route,
            response,
            confidence,
            classification: analysis.classification,
            error,
            timestamp: Utc::now(),
        })
    }
}

fn user_metadata(
    session_id: &str,
    analysis: &MathAnalysis,
    keywords: Vec<String>,
    sensitive: bool,
) -> Result<Map<String, Value>, AppError> {
    let mut metadata = Map::new();
    metadata.insert("session_id".to_string(), Value::String(session_id.to_string()));
    metadata.insert(
        "classification".to_string(),
        serde_json::to_value(&analysis.classification)?,
    );
    metadata.insert("keywords".to_string(), serde_json::to_value(keywords)?);
    metadata.insert("sensitive".to_string(), Value::Bool(sensitive));
    Ok(metadata)
}
