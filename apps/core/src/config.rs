//! Application configuration.
//!
//! Loaded once from the environment (a `.env` file is honoured) and
//! validated before any actor is spawned.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_LLM_URL: &str = "http://localhost:8080";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Voxen, a helpful AI assistant. Provide clear, informative, and helpful responses to user questions. Be friendly and engaging in your conversations.";

pub const DEFAULT_MATH_SYSTEM_PROMPT: &str = "You are Voxen, a careful mathematics assistant. Work through the problem step by step and state the final answer clearly.";

pub const WELCOME_MESSAGE: &str = "Hello! I'm Voxen, your AI assistant. I can help you with:\n• Answering questions\n• Solving equations and evaluating expressions\n• Having conversations\n\nJust ask me anything!";

/// Quick-start prompts offered by the terminal driver
const SAMPLE_QUESTIONS: &[&str] = &[
    "What is artificial intelligence?",
    "Tell me a joke",
    "How does machine learning work?",
    "Solve 2x + 5 = 13",
    "What is the derivative of x^2?",
    "Explain quantum computing",
    "What are the benefits of renewable energy?",
    "How do neural networks function?",
    "What is the area of a circle with radius 3?",
    "What is the future of technology?",
];

/// Sample questions, optionally filtered by a case-insensitive substring.
pub fn sample_questions(category: Option<&str>) -> Vec<&'static str> {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => {
            let needle = category.to_lowercase();
            SAMPLE_QUESTIONS
                .iter()
                .copied()
                .filter(|q| q.to_lowercase().contains(&needle))
                .collect()
        }
        None => SAMPLE_QUESTIONS.to_vec(),
    }
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("Unknown log format: {}", other))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Language-model service settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    /// Base URL of the llama.cpp-compatible server.
    #[validate(url)]
    pub server_url: String,
    /// Sampling temperature. Value between 0.0 and 2.0.
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    /// Maximum number of tokens to generate (`n_predict`).
    #[validate(range(min = 1))]
    pub max_length: u32,
    /// Per-request timeout, in seconds.
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u64,
    /// Bearer token sent to the server, if any.
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_LLM_URL.to_string(),
            temperature: 0.7,
            max_length: 1000,
            request_timeout_secs: 30,
            auth_token: None,
        }
    }
}

/// URL of endpoint `name` under the server base URL.
///
/// A trailing slash on the base is ignored and a base path is kept, so
/// `http://host/api/` with `completion` gives `http://host/api/completion`.
pub fn endpoint_url(base: &str, name: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("Server URL cannot have a path: {}", base)))?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

/// Conversation and routing settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatConfig {
    /// Messages kept in history before the oldest are evicted.
    #[validate(range(min = 1))]
    pub max_history: usize,
    /// Recent messages handed to the responders as context.
    pub context_messages: usize,
    /// Responses longer than this (in characters) are truncated.
    #[validate(range(min = 1))]
    pub max_response_length: usize,
    /// Turns allowed per session per minute.
    #[validate(range(min = 1))]
    pub rate_limit_per_minute: usize,
    /// Minimum classifier confidence (exclusive) for the math route.
    #[validate(range(min = 0.0, max = 1.0))]
    pub math_threshold: f32,
    #[validate(length(min = 1))]
    pub system_prompt: String,
    #[validate(length(min = 1))]
    pub math_system_prompt: String,
    /// Words that flag a user message as sensitive in its metadata.
    pub sensitive_words: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            context_messages: 10,
            max_response_length: 2000,
            rate_limit_per_minute: 100,
            math_threshold: 0.5,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            math_system_prompt: DEFAULT_MATH_SYSTEM_PROMPT.to_string(),
            sensitive_words: vec!["password".to_string(), "api key".to_string()],
        }
    }
}

/// Numeric evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MathConfig {
    /// Decimals kept in numeric answers.
    #[validate(range(max = 15))]
    pub decimal_precision: usize,
    /// Iteration cap for root refinement.
    #[validate(range(min = 1))]
    pub max_iterations: u32,
    /// Convergence tolerance.
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub tolerance: f64,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            decimal_precision: 4,
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub model: ModelConfig,
    #[validate(nested)]
    pub chat: ChatConfig,
    #[validate(nested)]
    pub math: MathConfig,
    pub log_format: LogFormat,
}

/// Parse an environment variable, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", key, raw))),
        _ => Ok(default),
    }
}

impl AppConfig {
    /// Build the configuration from `VOXEN_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        // A missing .env file is fine
        let _ = dotenv::dotenv();

        let defaults = AppConfig::default();

        let model = ModelConfig {
            server_url: env_or("VOXEN_LLM_URL", defaults.model.server_url)?,
            temperature: env_or("VOXEN_TEMPERATURE", defaults.model.temperature)?,
            max_length: env_or("VOXEN_MAX_LENGTH", defaults.model.max_length)?,
            request_timeout_secs: env_or(
                "VOXEN_REQUEST_TIMEOUT_SECS",
                defaults.model.request_timeout_secs,
            )?,
            auth_token: env::var("LLAMA_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
        };

        let chat = ChatConfig {
            max_history: env_or("VOXEN_MAX_HISTORY", defaults.chat.max_history)?,
            context_messages: env_or("VOXEN_CONTEXT_MESSAGES", defaults.chat.context_messages)?,
            max_response_length: env_or(
                "VOXEN_MAX_RESPONSE_LENGTH",
                defaults.chat.max_response_length,
            )?,
            rate_limit_per_minute: env_or("VOXEN_RATE_LIMIT", defaults.chat.rate_limit_per_minute)?,
            math_threshold: env_or("VOXEN_MATH_THRESHOLD", defaults.chat.math_threshold)?,
            ..defaults.chat
        };

        let math = MathConfig {
            decimal_precision: env_or("VOXEN_DECIMAL_PRECISION", defaults.math.decimal_precision)?,
            max_iterations: env_or("VOXEN_MAX_ITERATIONS", defaults.math.max_iterations)?,
            tolerance: env_or("VOXEN_TOLERANCE", defaults.math.tolerance)?,
        };

        let config = AppConfig {
            model,
            chat,
            math,
            log_format: env_or("VOXEN_LOG_FORMAT", defaults.log_format)?,
        };
        config.validate()?;

        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "VOXEN_LLM_URL",
        "VOXEN_TEMPERATURE",
        "VOXEN_MAX_LENGTH",
        "VOXEN_REQUEST_TIMEOUT_SECS",
        "VOXEN_MAX_HISTORY",
        "VOXEN_CONTEXT_MESSAGES",
        "VOXEN_MAX_RESPONSE_LENGTH",
        "VOXEN_RATE_LIMIT",
        "VOXEN_MATH_THRESHOLD",
        "VOXEN_DECIMAL_PRECISION",
        "VOXEN_MAX_ITERATIONS",
        "VOXEN_TOLERANCE",
        "VOXEN_LOG_FORMAT",
        "LLAMA_AUTH_TOKEN",
    ];

    /// Every known key, unset unless overridden.
    fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect()
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(env_with(&[]), || {
            let config = AppConfig::from_env().expect("defaults should load");

            assert_eq!(config.model.server_url, DEFAULT_LLM_URL);
            assert_eq!(config.model.temperature, 0.7);
            assert_eq!(config.model.max_length, 1000);
            assert_eq!(config.model.request_timeout_secs, 30);
            assert_eq!(config.chat.max_history, 50);
            assert_eq!(config.chat.max_response_length, 2000);
            assert_eq!(config.chat.rate_limit_per_minute, 100);
            assert_eq!(config.chat.math_threshold, 0.5);
            assert_eq!(config.math.decimal_precision, 4);
            assert_eq!(config.math.max_iterations, 1000);
            assert_eq!(config.math.tolerance, 1e-6);
            assert_eq!(config.log_format, LogFormat::Pretty);
            assert!(config.model.auth_token.is_none());
        });
    }

    #[test]
    fn test_overrides() {
        let vars = env_with(&[
            ("VOXEN_LLM_URL", "http://127.0.0.1:9000"),
            ("VOXEN_MAX_HISTORY", "10"),
            ("VOXEN_DECIMAL_PRECISION", "2"),
            ("VOXEN_LOG_FORMAT", "json"),
            ("LLAMA_AUTH_TOKEN", "secret"),
        ]);

        temp_env::with_vars(vars, || {
            let config = AppConfig::from_env().expect("overrides should load");

            assert_eq!(config.model.server_url, "http://127.0.0.1:9000");
            assert_eq!(config.chat.max_history, 10);
            assert_eq!(config.math.decimal_precision, 2);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.model.auth_token.as_deref(), Some("secret"));
        });
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let vars = env_with(&[("VOXEN_MAX_HISTORY", "lots")]);

        temp_env::with_vars(vars, || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
            assert!(err.to_string().contains("VOXEN_MAX_HISTORY"));
        });
    }

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("http://localhost:8080", "completion").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/completion");

        let url = endpoint_url("http://localhost:8080/", "completion").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/completion");

        let url = endpoint_url("https://llm.internal/api/v1/", "completion").unwrap();
        assert_eq!(url.as_str(), "https://llm.internal/api/v1/completion");

        let err = endpoint_url("not a url", "completion").unwrap_err();
        assert!(err.to_string().contains("URL parse error"));

        assert!(matches!(
            endpoint_url("mailto:someone@example.com", "completion"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_value_fails_validation() {
        let vars = env_with(&[("VOXEN_TEMPERATURE", "3.5"), ("VOXEN_LLM_URL", "not a url")]);

        temp_env::with_vars(vars, || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        });
    }

    #[test]
    fn test_auth_token_is_not_serialized() {
        let config = AppConfig {
            model: ModelConfig {
                auth_token: Some("secret".to_string()),
                ..ModelConfig::default()
            },
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_sample_questions() {
        assert_eq!(sample_questions(None).len(), SAMPLE_QUESTIONS.len());
        assert_eq!(sample_questions(Some("  ")).len(), SAMPLE_QUESTIONS.len());
        assert_eq!(sample_questions(Some("JOKE")), vec!["Tell me a joke"]);
        assert!(sample_questions(Some("zebra")).is_empty());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
