pub mod agent;

pub use agent::{
    AgentBackend, AgentChatRequest, AgentChatResponse, AgentContext, HistoryTurn, HttpAgentClient,
};
