//! Turns a chat message into an agent round trip.
//!
//! One send at a time: the user turn is appended immediately, the request is
//! built from the transcript and the live workspace state, the returned actions
//! run in order, and exactly one assistant turn closes the exchange.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::ai::{AgentBackend, AgentChatRequest, AgentContext, HistoryTurn};
use crate::bridge::BridgeSlot;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::conversation::ConversationStore;
use crate::executor::{self, Collaborators, Navigator};
use crate::quick_actions::{self, QuickAction};
use crate::session::SessionState;
use crate::state::{ChatMessage, FALLBACK_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty input, or a send was already in flight
    Ignored,
    Completed,
    /// The endpoint failed and the fallback message was appended
    Failed,
}

/// Immutable copy of what a renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub is_open: bool,
    pub is_minimized: bool,
    pub is_loading: bool,
    pub messages: Vec<ChatMessage>,
    pub suggestions: Vec<String>,
}

pub struct AgentDispatcher {
    backend: Arc<dyn AgentBackend>,
    navigator: Arc<dyn Navigator>,
    bridge: BridgeSlot,
    store: Arc<Mutex<ConversationStore>>,
    history_limit: usize,
}

impl AgentDispatcher {
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        navigator: Arc<dyn Navigator>,
        bridge: BridgeSlot,
        store: ConversationStore,
    ) -> Self {
        Self {
            backend,
            navigator,
            bridge,
            store: Arc::new(Mutex::new(store)),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn bridge(&self) -> &BridgeSlot {
        &self.bridge
    }

    pub async fn send_message(&self, content: &str) -> SendOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }

        let request = {
            let mut store = self.lock_store();
            if !store.begin_request() {
                tracing::debug!("send ignored, a request is already in flight");
                return SendOutcome::Ignored;
            }
            let history = self.history(store.messages());
            store.push(ChatMessage::user(content));
            store.clear_suggestions();

            AgentChatRequest {
                message: content.to_string(),
                history,
                context: self.context(),
            }
        };
        let _loading = LoadingGuard {
            store: self.store.clone(),
        };

        tracing::info!(history = request.history.len(), "sending agent message");
        let response = match self.backend.chat(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Agent request failed: {}", e);
                self.lock_store().push(ChatMessage::assistant(FALLBACK_MESSAGE));
                return SendOutcome::Failed;
            }
        };

        let results = if response.actions.is_empty() {
            Vec::new()
        } else {
            let collaborators = Collaborators {
                navigator: self.navigator.as_ref(),
                bridge: &self.bridge,
            };
            executor::execute(&response.actions, &collaborators).await
        };

        let mut store = self.lock_store();
        store.push(ChatMessage::assistant_with_actions(
            &response.response,
            response.actions,
            results,
        ));
        store.set_suggestions(response.suggestions);
        SendOutcome::Completed
    }

    /// Resend the most recent user message
    pub async fn retry_last(&self) -> SendOutcome {
        let last = self
            .lock_store()
            .last_user_message()
            .map(|m| m.content.clone());
        match last {
            Some(content) => self.send_message(&content).await,
            None => SendOutcome::Ignored,
        }
    }

    pub async fn send_quick_action(&self, action: &QuickAction) -> SendOutcome {
        self.send_message(action.prompt).await
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        quick_actions::resolve(&self.navigator.current_page())
    }

    pub fn open(&self) {
        self.lock_store().open();
    }

    pub fn close(&self) {
        self.lock_store().close();
    }

    pub fn toggle(&self) {
        self.lock_store().toggle();
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.lock_store().set_minimized(minimized);
    }

    pub fn clear_messages(&self) {
        self.lock_store().clear_messages();
    }

    pub fn restore(&self, session: SessionState) {
        self.lock_store().restore(session);
    }

    pub fn is_loading(&self) -> bool {
        self.lock_store().is_loading()
    }

    pub fn snapshot(&self) -> ChatView {
        let store = self.lock_store();
        ChatView {
            is_open: store.is_open(),
            is_minimized: store.is_minimized(),
            is_loading: store.is_loading(),
            messages: store.messages().to_vec(),
            suggestions: store.suggestions().to_vec(),
        }
    }

    fn history(&self, messages: &[ChatMessage]) -> Vec<HistoryTurn> {
        let start = messages.len().saturating_sub(self.history_limit);
        messages[start..]
            .iter()
            .map(|m| HistoryTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    fn context(&self) -> AgentContext {
        let mut context = AgentContext {
            current_page: self.navigator.current_page(),
            ..Default::default()
        };
        if let Some(bridge) = self.bridge.current() {
            if let Some(selected) = &bridge.snapshot.selected_keyword {
                context.selected_keyword_id = Some(selected.id.clone());
                context.selected_keyword_name = Some(selected.keyword.clone());
            }
            context.keywords_list = bridge.snapshot.keywords.clone();
        }
        context
    }

    fn lock_store(&self) -> MutexGuard<'_, ConversationStore> {
        lock(&self.store)
    }
}

fn lock(store: &Mutex<ConversationStore>) -> MutexGuard<'_, ConversationStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clears the loading flag however the send ends
struct LoadingGuard {
    store: Arc<Mutex<ConversationStore>>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        lock(&self.store).finish_request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AgentChatResponse;
    use crate::error::AgentClientError;
    use crate::session::MemorySessionStorage;
    use crate::state::{AgentAction, ChatRole};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedPage(&'static str);

    impl Navigator for FixedPage {
        fn current_page(&self) -> String {
            self.0.to_string()
        }

        fn navigate(&self, _path: &str, _query: &[(String, String)]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Echoes back the request it saw
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<AgentChatRequest>>,
    }

    #[async_trait]
    impl AgentBackend for Recorder {
        async fn chat(&self, request: &AgentChatRequest) -> Result<AgentChatResponse, AgentClientError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(AgentChatResponse {
                response: format!("echo: {}", request.message),
                actions: vec![AgentAction::new("navigate", json!({"page": "/keywords"}))],
                suggestions: vec!["more".to_string()],
            })
        }
    }

    fn dispatcher(backend: Arc<Recorder>) -> AgentDispatcher {
        AgentDispatcher::new(
            backend,
            Arc::new(FixedPage("/geoint")),
            BridgeSlot::new(),
            ConversationStore::restore_from(Box::new(MemorySessionStorage::new())),
        )
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = Arc::new(Recorder::default());
        let dispatcher = dispatcher(backend.clone());
        dispatcher.open();

        assert_eq!(dispatcher.send_message("   \n").await, SendOutcome::Ignored);
        assert_eq!(dispatcher.snapshot().messages.len(), 1);
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_capped_and_excludes_current_message() {
        let backend = Arc::new(Recorder::default());
        let dispatcher = dispatcher(backend.clone()).with_history_limit(3);
        dispatcher.open();

        for i in 0..4 {
            dispatcher.send_message(&format!("message {}", i)).await;
        }

        let requests = backend.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.message, "message 3");
        assert_eq!(last.history.len(), 3);
        assert_eq!(last.history[0].role, ChatRole::Assistant);
        assert_eq!(last.history[1].content, "message 2");
        assert_eq!(last.history[2].content, "echo: message 2");
        assert_eq!(last.context.current_page, "/geoint");
        assert!(last.context.keywords_list.is_empty());
    }

    #[tokio::test]
    async fn test_reply_carries_aligned_results_and_suggestions() {
        let dispatcher = dispatcher(Arc::new(Recorder::default()));
        dispatcher.open();

        assert_eq!(dispatcher.send_message("go").await, SendOutcome::Completed);

        let view = dispatcher.snapshot();
        let reply = view.messages.last().unwrap();
        assert_eq!(reply.actions.as_ref().unwrap().len(), 1);
        assert_eq!(reply.action_results.as_ref().unwrap().len(), 1);
        assert!(reply.action_results.as_ref().unwrap()[0].success);
        assert_eq!(view.suggestions, vec!["more".to_string()]);
        assert!(!view.is_loading);
    }

    #[tokio::test]
    async fn test_retry_resends_last_user_message() {
        let backend = Arc::new(Recorder::default());
        let dispatcher = dispatcher(backend.clone());
        assert_eq!(dispatcher.retry_last().await, SendOutcome::Ignored);

        dispatcher.send_message("budget?").await;
        dispatcher.retry_last().await;

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].message, "budget?");
    }

    #[test]
    fn test_quick_actions_follow_current_page() {
        let dispatcher = dispatcher(Arc::new(Recorder::default()));
        assert_eq!(dispatcher.quick_actions(), quick_actions::resolve("/geoint"));
    }
}
