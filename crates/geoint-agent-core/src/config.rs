use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::bridge::KeywordEntry;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_TOGGLE_CHORD: &str = "ctrl+k";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Unset means requests may wait forever
    pub request_timeout_secs: Option<u64>,
    pub history_limit: usize,
    pub toggle_chord: String,
    pub session_path: Option<PathBuf>,
    /// Entities offered by the host's GEOINT workspace
    pub keywords: Vec<KeywordEntry>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            toggle_chord: DEFAULT_TOGGLE_CHORD.to_string(),
            session_path: None,
            keywords: Vec::new(),
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: AgentConfig = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Environment variables win over the config file
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(
            std::env::var("GEOINT_API_URL").ok(),
            std::env::var("GEOINT_API_TOKEN").ok(),
        );
        self
    }

    fn apply_overrides(&mut self, api_url: Option<String>, api_token: Option<String>) {
        if let Some(url) = non_blank(api_url) {
            self.api_base_url = url;
        }
        if let Some(token) = non_blank(api_token) {
            self.api_token = Some(token);
        }
    }

    /// Returns where the API token came from: "env", "config", or None
    pub fn token_source(&self) -> Option<&'static str> {
        Self::token_source_with(std::env::var("GEOINT_API_TOKEN").ok(), self.api_token.as_deref())
    }

    fn token_source_with(env_token: Option<String>, config_token: Option<&str>) -> Option<&'static str> {
        if non_blank(env_token).is_some() {
            Some("env")
        } else if config_token.is_some_and(|t| !t.trim().is_empty()) {
            Some("config")
        } else {
            None
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("geoint-agent").join("config.json"))
    }
}

/// Blank environment values count as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
