//! In-memory conversation history.
//!
//! Bounded FIFO of user and assistant messages, owned by the supervisor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used in prompts and text exports.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Counts and span of the current history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Whole minutes between the first and last message
    pub duration_minutes: i64,
}

impl fmt::Display for ConversationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages ({} user, {} assistant) over {} minutes",
            self.total_messages, self.user_messages, self.assistant_messages, self.duration_minutes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(AppError::Validation(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Bounded message store; the oldest messages are evicted first.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<ConversationMessage>,
    max_history: usize,
}

impl ConversationHistory {
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(max_history.min(256)),
            max_history,
        }
    }

    /// Append a message, evicting from the front beyond `max_history`.
    pub fn append(&mut self, message: ConversationMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_history {
            self.messages.pop_front();
        }
    }

    /// The last `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> Vec<ConversationMessage> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    pub fn summary(&self) -> ConversationSummary {
        let user_messages = self.messages.iter().filter(|m| m.role == Role::User).count();
        let duration_minutes = match (self.messages.front(), self.messages.back()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_minutes(),
            _ => 0,
        };

        ConversationSummary {
            total_messages: self.messages.len(),
            user_messages,
            assistant_messages: self.messages.len() - user_messages,
            duration_minutes,
        }
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, AppError> {
        match format {
            ExportFormat::Json => {
                let messages: Vec<&ConversationMessage> = self.messages.iter().collect();
                Ok(serde_json::to_string_pretty(&messages)?)
            }
            ExportFormat::Text => {
                let mut text = String::from("AI Chat Conversation\n");
                text.push_str(&"=".repeat(30));
                text.push_str("\n\n");
                for message in &self.messages {
                    text.push_str(&format!(
                        "[{}] {}:\n{}\n\n",
                        message.timestamp.to_rfc3339(),
                        message.role.label(),
                        message.content
                    ));
                }
                Ok(text)
            }
        }
    }

    /// Messages whose content contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<ConversationMessage> {
        let needle = query.to_lowercase();
        self.messages
            .iter()
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

/// Prompt preamble: the system prompt, a blank line, then one
/// "Role: content" line per message.
pub fn context_prompt(system_prompt: &str, messages: &[ConversationMessage]) -> String {
    let mut context = format!("{}\n\n", system_prompt.trim());
    for message in messages {
        context.push_str(&format!("{}: {}\n", message.role.label(), message.content));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: Role, content: &str) -> ConversationMessage {
        ConversationMessage::new(role, content, Map::new())
    }

    fn history_with(contents: &[&str]) -> ConversationHistory {
        let mut history = ConversationHistory::new(50);
        for (i, content) in contents.iter().enumerate() {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            history.append(message(role, content));
        }
        history
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = ConversationHistory::new(3);
        for i in 0..5 {
            history.append(message(Role::User, &format!("m{}", i)));
        }

        assert_eq!(history.len(), 3);
        let contents: Vec<String> = history.iter().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_recent() {
        let history = history_with(&["a", "b", "c"]);

        let recent: Vec<String> = history.recent(2).into_iter().map(|m| m.content).collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(history.recent(10).len(), 3);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn test_context_prompt() {
        let history = history_with(&["hi", "hello", "bye"]);
        assert_eq!(
            context_prompt(" System. ", &history.recent(2)),
            "System.\n\nAssistant: hello\nUser: bye\n"
        );
        assert_eq!(context_prompt("System.", &[]), "System.\n\n");
    }

    #[test]
    fn test_summary() {
        let history = history_with(&["q1", "a1", "q2"]);
        let summary = history.summary();

        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.user_messages, 2);
        assert_eq!(summary.assistant_messages, 1);
        assert_eq!(summary.duration_minutes, 0);

        let empty = ConversationHistory::new(5).summary();
        assert_eq!(empty.total_messages, 0);
        assert_eq!(empty.to_string(), "0 messages (0 user, 0 assistant) over 0 minutes");
    }

    #[test]
    fn test_export_json() {
        let mut history = ConversationHistory::new(5);
        let mut metadata = Map::new();
        metadata.insert("route".to_string(), Value::String("math".to_string()));
        history.append(ConversationMessage::new(Role::Assistant, "4", metadata));

        let exported = history.export(ExportFormat::Json).unwrap();
        let parsed: Vec<ConversationMessage> = serde_json::from_str(&exported).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].role, Role::Assistant);
        assert_eq!(parsed[0].metadata["route"], "math");
        assert!(exported.contains("\"role\": \"assistant\""));
    }

    #[test]
    fn test_export_text() {
        let history = history_with(&["hi", "hello"]);
        let exported = history.export(ExportFormat::Text).unwrap();

        assert!(exported.starts_with("AI Chat Conversation\n==============================\n\n"));
        assert!(exported.contains("] User:\nhi\n\n"));
        assert!(exported.contains("] Assistant:\nhello\n\n"));
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);

        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(err.to_string().contains("Unsupported export format: pdf"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let history = history_with(&["Solve X", "x = 4", "thanks"]);

        assert_eq!(history.search("x").len(), 2);
        assert!(history.search("missing").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = history_with(&["a", "b"]);
        history.clear();
        assert!(history.is_empty());
    }
}
