//! UI-agnostic conversation types
//!
//! These structures are shared by every host of the agent (terminal, desktop,
//! web bridge) and are also the on-disk shape of a saved chat session, which is
//! why the field names serialize in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of the canned greeting that opens every fresh transcript
pub const WELCOME_MESSAGE_ID: &str = "welcome";

pub const WELCOME_MESSAGE: &str = "Hi! I'm your GEOINT assistant. I can pick keywords, \
run GEOINT and budget calculations, move the map and take you to any page. \
What would you like to do?";

/// Shown instead of a reply whenever the agent endpoint cannot be reached
pub const FALLBACK_MESSAGE: &str =
    "Sorry, something went wrong while contacting the assistant. Please try again.";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A tool call emitted by the remote reasoning service.
///
/// Kept exactly as received: `tool` is not trusted to be a known name and
/// `parameters` is not trusted to have any particular shape. See
/// [`crate::tool::ToolCall::parse`] for validation.
///
/// Decoding never fails: a missing tool becomes an empty name and a non-string
/// tool keeps its JSON text, so both are later rejected as unsupported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct AgentAction {
    pub tool: String,
    pub parameters: Value,
}

impl AgentAction {
    pub fn new(tool: &str, parameters: Value) -> Self {
        Self {
            tool: tool.to_string(),
            parameters,
        }
    }
}

impl From<Value> for AgentAction {
    fn from(raw: Value) -> Self {
        let mut fields = match raw {
            Value::Object(fields) => fields,
            other => {
                return Self {
                    tool: other.to_string(),
                    parameters: Value::Null,
                }
            }
        };
        let tool = match fields.remove("tool") {
            Some(Value::String(name)) => name,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self {
            tool,
            parameters: fields.remove("parameters").unwrap_or(Value::Null),
        }
    }
}

/// Outcome of executing one [`AgentAction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub tool: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A chat message in the agent conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<AgentAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_results: Option<Vec<ActionResult>>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// An assistant turn that carries the actions it requested and their outcomes.
    ///
    /// `results` must be index-aligned with `actions`; an empty action list
    /// produces a plain assistant message.
    pub fn assistant_with_actions(
        content: &str,
        actions: Vec<AgentAction>,
        results: Vec<ActionResult>,
    ) -> Self {
        debug_assert_eq!(actions.len(), results.len());
        let mut message = Self::assistant(content);
        if !actions.is_empty() {
            message.actions = Some(actions);
            message.action_results = Some(results);
        }
        message
    }

    pub fn welcome() -> Self {
        Self {
            id: WELCOME_MESSAGE_ID.to_string(),
            ..Self::assistant(WELCOME_MESSAGE)
        }
    }

    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_MESSAGE_ID
            && self.role == ChatRole::Assistant
            && self.content == WELCOME_MESSAGE
    }

    fn new(role: ChatRole, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            actions: None,
            action_results: None,
        }
    }
}
