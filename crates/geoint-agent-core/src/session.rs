//! Durable storage for the chat panel's session.
//!
//! The whole session (open/minimized flags plus the transcript) is written as
//! one JSON document under a single key, and read back once at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::state::ChatMessage;

/// File name of the stored session inside the data directory
pub const SESSION_KEY: &str = "agent-chat-session.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_open: bool,
    pub is_minimized: bool,
    pub messages: Vec<ChatMessage>,
}

impl SessionState {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Where the session lives between runs
pub trait SessionStorage: Send {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<SessionState>>;

    fn save(&self, state: &SessionState) -> Result<()>;
}

/// One JSON file, by default under the user's data directory
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(Self::new(data_dir.join("geoint-agent").join(SESSION_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        SessionState::decode(&raw).map(Some)
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, state.encode()?)?;
        Ok(())
    }
}

/// In-memory storage; clones share the same slot
#[derive(Clone, Default)]
pub struct MemorySessionStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already serialized document, valid or not
    pub fn with_raw(raw: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.to_string()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<SessionState>> {
        match self.raw() {
            Some(raw) => SessionState::decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &SessionState) -> Result<()> {
        let encoded = state.encode()?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow!("session storage lock poisoned"))?;
        *slot = Some(encoded);
        Ok(())
    }
}
