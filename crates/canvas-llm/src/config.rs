use std::path::PathBuf;

use canvas_core::{DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

const CONFIG_FILE_PATH: &str = "canvas.toml";

/// Client-side settings for talking to the messages proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// `~/.chat-canvas`, falling back to the temp dir when there is no home.
pub fn canvas_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".chat-canvas")
}

fn config_json_path() -> PathBuf {
    canvas_dir().join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Config {
    /// Load from `~/.chat-canvas/config.json`, else `./canvas.toml`, then
    /// apply `CANVAS_*` environment overrides.
    pub fn load() -> Self {
        let mut config = Config::default();

        let mut loaded = false;
        let json_path = config_json_path();
        if json_path.exists() {
            match std::fs::read_to_string(&json_path) {
                Ok(content) => match serde_json::from_str::<Config>(&content) {
                    Ok(file_config) => {
                        config = file_config;
                        loaded = true;
                    }
                    Err(e) => log::warn!("Ignoring malformed {}: {}", json_path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", json_path.display(), e),
            }
        }

        if !loaded && std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(e) => log::warn!("Ignoring malformed {}: {}", CONFIG_FILE_PATH, e),
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CANVAS_API_URL") {
            self.api_url = url;
        }
        if let Some(raw) = lookup("CANVAS_MAX_TOKENS") {
            match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => self.max_tokens = value,
                _ => log::warn!("Ignoring invalid CANVAS_MAX_TOKENS={:?}", raw),
            }
        }
        if let Some(prompt) = lookup("CANVAS_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
    }

    pub fn messages_url(&self) -> String {
        format!("{}/api/messages", self.api_url.trim_end_matches('/'))
    }
}
