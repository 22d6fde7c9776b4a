use std::sync::Arc;

use anyhow::{anyhow, Result};
use geoint_agent_core::{
    AgentConfig, AgentDispatcher, BridgeSlot, ConversationStore, FileSessionStorage,
    HttpAgentClient, KeyChord, QuickAction, SendOutcome,
};
use tokio::task::JoinHandle;

use crate::router::{AppRouter, Page};
use crate::workspace::{GeointWorkspace, MountedWorkspace};

pub struct App {
    pub should_quit: bool,
    pub toggle_chord: KeyChord,

    pub dispatcher: Arc<AgentDispatcher>,
    pub router: AppRouter,

    // GEOINT feature module; mounted only while its page is shown
    pub workspace: Arc<GeointWorkspace>,
    pub mounted: Option<MountedWorkspace>,
    pub keyword_cursor: usize,

    // Chat input
    pub input: String,
    pub cursor: usize,
    pub chat_scroll: u16,
    pub send_task: Option<JoinHandle<SendOutcome>>,
    pub animation_frame: usize,
}

impl App {
    pub fn new(config: AgentConfig) -> Result<Self> {
        let toggle_chord: KeyChord = config
            .toggle_chord
            .parse()
            .map_err(|e| anyhow!("invalid toggle_chord in config: {}", e))?;

        let client = HttpAgentClient::new(
            &config.api_base_url,
            config.api_token.as_deref(),
            config.request_timeout(),
        )?;
        if config.token_source().is_none() {
            tracing::warn!("No API token configured; agent requests will be unauthenticated");
        }

        let storage = match &config.session_path {
            Some(path) => FileSessionStorage::new(path),
            None => FileSessionStorage::default_location()?,
        };
        tracing::info!(path = %storage.path().display(), "chat session storage");
        let store = ConversationStore::restore_from(Box::new(storage));

        let router = AppRouter::new();
        let slot = BridgeSlot::new();
        let dispatcher = AgentDispatcher::new(
            Arc::new(client),
            Arc::new(router.clone()),
            slot,
            store,
        )
        .with_history_limit(config.history_limit);

        let mut app = Self {
            should_quit: false,
            toggle_chord,
            dispatcher: Arc::new(dispatcher),
            router,
            workspace: Arc::new(GeointWorkspace::new(config.keywords.clone())),
            mounted: None,
            keyword_cursor: 0,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            send_task: None,
            animation_frame: 0,
        };
        app.sync_mount();
        Ok(app)
    }

    pub fn page(&self) -> Page {
        self.router.location().page()
    }

    pub fn go(&mut self, page: Page) {
        self.router.go(page);
        self.sync_mount();
    }

    /// Mount the GEOINT workspace while its page is shown, unmount otherwise.
    /// The agent can navigate on its own, so this also runs on every tick.
    pub fn sync_mount(&mut self) {
        let on_geoint = self.page() == Page::Geoint;
        match (on_geoint, self.mounted.is_some()) {
            (true, false) => {
                let slot = self.dispatcher.bridge();
                self.mounted = Some(MountedWorkspace::mount(slot, self.workspace.clone()));
            }
            (false, true) => self.mounted = None,
            _ => {}
        }
    }

    pub fn quick_actions(&self) -> &'static [QuickAction] {
        self.dispatcher.quick_actions()
    }

    /// Typed text stays in the input until a send actually starts
    pub fn submit_input(&mut self) {
        self.reap_finished_send();
        if self.input.trim().is_empty()
            || self.send_task.is_some()
            || self.dispatcher.is_loading()
        {
            return;
        }
        let prompt = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.send(prompt);
    }

    pub fn send_quick_action(&mut self, index: usize) {
        if let Some(action) = self.quick_actions().get(index) {
            self.send(action.prompt.to_string());
        }
    }

    pub fn send_suggestion(&mut self, index: usize) {
        let suggestion = self.dispatcher.snapshot().suggestions.get(index).cloned();
        if let Some(suggestion) = suggestion {
            self.send(suggestion);
        }
    }

    pub fn retry(&mut self) {
        self.reap_finished_send();
        if self.send_task.is_some() {
            return;
        }
        let dispatcher = self.dispatcher.clone();
        self.chat_scroll = 0;
        self.send_task = Some(tokio::spawn(async move { dispatcher.retry_last().await }));
    }

    fn send(&mut self, prompt: String) {
        self.reap_finished_send();
        if self.send_task.is_some() {
            return;
        }
        let dispatcher = self.dispatcher.clone();
        self.chat_scroll = 0;
        self.send_task = Some(tokio::spawn(async move { dispatcher.send_message(&prompt).await }));
    }

    pub fn tick(&mut self) {
        if self.dispatcher.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.reap_finished_send();
        self.sync_mount();
    }

    fn reap_finished_send(&mut self) {
        if !self.send_task.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        if let Some(task) = self.send_task.take() {
            tokio::spawn(async move {
                match task.await {
                    Ok(outcome) => tracing::debug!(?outcome, "send finished"),
                    Err(e) => tracing::error!("send task panicked: {}", e),
                }
            });
        }
    }

    pub fn keyword_down(&mut self) {
        let count = self.workspace.state().keywords.len();
        if count > 0 {
            self.keyword_cursor = (self.keyword_cursor + 1).min(count - 1);
        }
    }

    pub fn keyword_up(&mut self) {
        self.keyword_cursor = self.keyword_cursor.saturating_sub(1);
    }

    pub fn select_keyword_at_cursor(&mut self) {
        self.workspace.select_index(self.keyword_cursor);
    }
}
