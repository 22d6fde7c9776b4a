use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::bridge::KeywordEntry;
use crate::error::AgentClientError;
use crate::state::{AgentAction, ChatRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Situational context sent alongside each message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentContext {
    pub current_page: String,
    pub selected_keyword_id: Option<String>,
    pub selected_keyword_name: Option<String>,
    pub keywords_list: Vec<KeywordEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentChatRequest {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub context: AgentContext,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentChatResponse {
    pub response: String,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<AgentAction>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// `null` means no actions; a lone object is one action. Individual entries are
/// never rejected here, see [`AgentAction`].
fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<AgentAction>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries.into_iter().map(AgentAction::from).collect(),
        Value::Null => Vec::new(),
        other => vec![AgentAction::from(other)],
    })
}

/// The remote reasoning service
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn chat(&self, request: &AgentChatRequest) -> Result<AgentChatResponse, AgentClientError>;
}

#[derive(Clone)]
pub struct HttpAgentClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAgentClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, AgentClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/ai/agent/chat", self.base_url)
    }
}

#[async_trait]
impl AgentBackend for HttpAgentClient {
    async fn chat(&self, request: &AgentChatRequest) -> Result<AgentChatResponse, AgentClientError> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(AgentClientError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let agent_response: AgentChatResponse = serde_json::from_slice(&body)?;
        Ok(agent_response)
    }
}
