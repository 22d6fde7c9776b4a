//! Chat transcript, panel flags and request bookkeeping.
//!
//! Every change to the open/minimized flags or to the transcript is written
//! through the [`SessionStorage`] before the call returns. The loading flag and
//! the follow-up suggestions are runtime-only.

use crate::session::{SessionState, SessionStorage};
use crate::state::{ChatMessage, ChatRole};

pub struct ConversationStore {
    session: SessionState,
    is_loading: bool,
    suggestions: Vec<String>,
    storage: Box<dyn SessionStorage>,
}

impl ConversationStore {
    /// Rehydrate from `storage`. A missing or unreadable session starts fresh.
    pub fn restore_from(storage: Box<dyn SessionStorage>) -> Self {
        let session = match storage.load() {
            Ok(Some(session)) => {
                tracing::info!(messages = session.messages.len(), "restored chat session");
                session
            }
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!("Discarding unreadable chat session: {}", e);
                SessionState::default()
            }
        };

        let mut store = Self {
            session,
            is_loading: false,
            suggestions: Vec::new(),
            storage,
        };
        if store.session.is_open && store.session.messages.is_empty() {
            store.seed_welcome();
            store.persist();
        }
        store
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.session.messages
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open
    }

    pub fn is_minimized(&self) -> bool {
        self.session.is_minimized
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.session
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
    }

    pub fn open(&mut self) {
        self.session.is_open = true;
        self.session.is_minimized = false;
        self.seed_welcome();
        self.persist();
    }

    pub fn close(&mut self) {
        self.session.is_open = false;
        self.persist();
    }

    /// Keyboard-chord behavior: flip open/closed, opening always un-minimizes
    pub fn toggle(&mut self) {
        if self.session.is_open {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn set_minimized(&mut self, minimized: bool) {
        self.session.is_minimized = minimized;
        self.persist();
    }

    /// Append a turn. The transcript is never reordered.
    pub fn push(&mut self, message: ChatMessage) {
        self.session.messages.push(message);
        self.persist();
    }

    /// Reset to the single welcome message
    pub fn clear_messages(&mut self) {
        self.session.messages = vec![ChatMessage::welcome()];
        self.suggestions.clear();
        self.persist();
    }

    /// Replace the whole session, e.g. when importing a saved one
    pub fn restore(&mut self, session: SessionState) {
        self.session = session;
        if self.session.is_open {
            self.seed_welcome();
        }
        self.suggestions.clear();
        self.persist();
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<String>) {
        self.suggestions = suggestions;
    }

    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
    }

    /// Mark a request as outstanding. `false` if one already is.
    pub fn begin_request(&mut self) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        true
    }

    pub fn finish_request(&mut self) {
        self.is_loading = false;
    }

    fn seed_welcome(&mut self) {
        if self.session.messages.is_empty() {
            self.session.messages.push(ChatMessage::welcome());
        }
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.session) {
            tracing::error!("Failed to save chat session: {}", e);
        }
    }
}
