use crate::actors::messages::{AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::{endpoint_url, ModelConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Extra time the handle waits beyond the request timeout, so the runner
/// reports its own timeout first.
const HANDLE_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    request_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` talking to `config.server_url` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task.
    pub fn new(config: &ModelConfig) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = LlmActorRunner::new(receiver, config);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// A convenience method for generating text with default parameters.
    pub async fn generate(&self, prompt: String) -> Result<String, AppError> {
        self.generate_with_params(prompt, None, None).await
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn generate_with_params(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Generate {
            prompt,
            system_prompt,
            temperature,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(self.request_timeout + HANDLE_TIMEOUT_MARGIN, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))?
    }
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    server_url: String,
    client: Client,
    auth_token: Option<String>,
    n_predict: u32,
    temperature: f32,
    request_timeout: Duration,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, config: &ModelConfig) -> Self {
        Self {
            receiver,
            server_url: config.server_url.clone(),
            client: Client::new(),
            auth_token: config.auth_token.clone(),
            n_predict: config.max_length,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    async fn run(mut self) {
        info!("LlmActor started ({})", self.server_url);
        if self.auth_token.is_none() {
            warn!("LLAMA_AUTH_TOKEN is not set; completion requests are unauthenticated");
        }

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        info!("LlmActor stopped");
    }

    fn build_request(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Config(format!("Invalid auth token: {}", e)))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(self
            .client
            .post(endpoint_url(&self.server_url, endpoint)?)
            .headers(headers)
            .json(payload))
    }

    async fn handle_message(&mut self, msg: LlmMessage) {
        match msg {
            LlmMessage::Generate {
                prompt,
                system_prompt,
                temperature,
                responder,
            } => {
                let result = self
                    .generate_completion(prompt, system_prompt, temperature)
                    .await;
                let _ = responder.send(result);
            }
        }
    }

    #[instrument(skip_all, fields(prompt_chars = prompt.chars().count()))]
    async fn generate_completion(
        &self,
        prompt: String,
        system_prompt: Option<String>,
        temperature: Option<f32>,
    ) -> Result<String, AppError> {
        debug!("LLM generating for prompt: {}", prompt);

        let mut payload = serde_json::json!({
            "prompt": prompt,
            "stream": false,
            "n_predict": self.n_predict,
            "temperature": temperature.unwrap_or(self.temperature),
        });

        if let Some(system) = system_prompt {
            payload["system_prompt"] = serde_json::Value::String(system);
        }

        let request_future = self.build_request("completion", &payload)?.send();

        let res = timeout(self.request_timeout, request_future).await??;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Invalid completion response: {}", e)))?;

        Ok(json["content"].as_str().unwrap_or("").to_string())
    }
}
