pub mod ai;
pub mod bridge;
pub mod chord;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod quick_actions;
pub mod session;
pub mod state;
pub mod tool;

// Re-export main types for convenience
pub use ai::{AgentBackend, AgentChatRequest, AgentChatResponse, AgentContext, HttpAgentClient};
pub use bridge::{
    BridgePublisher, BridgeRegistration, BridgeSlot, BridgeSnapshot, ContextBridge, FeatureController,
    KeywordEntry,
};
pub use chord::KeyChord;
pub use config::AgentConfig;
pub use conversation::ConversationStore;
pub use dispatcher::{AgentDispatcher, ChatView, SendOutcome};
pub use error::{ActionError, AgentClientError, BridgeError};
pub use executor::{Collaborators, Navigator};
pub use quick_actions::QuickAction;
pub use session::{FileSessionStorage, MemorySessionStorage, SessionState, SessionStorage};
pub use state::{ActionResult, AgentAction, ChatMessage, ChatRole};
pub use tool::{AgentTool, ToolCall};
