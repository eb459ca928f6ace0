use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{RelayError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

// -- Upstream ------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout.  0 leaves reqwest without an explicit timeout.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Server-held credential.  `XAI_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: 0,
            api_key: String::new(),
        }
    }
}

// -- Chat ----------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    /// Forward at most this many history turns upstream (0 = unlimited).
    #[serde(default)]
    pub max_history_turns: usize,
}

// -- Server --------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Attach a permissive CORS layer to every route.
    #[serde(default)]
    pub cors_permissive: bool,
}

// -- Defaults ------------------------------------------------------------------

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}
fn default_model() -> String {
    "grok-2-1212".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upstream: UpstreamConfig::default(),
            chat: ChatConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

// -- Config impl ---------------------------------------------------------------

impl Config {
    /// Load config from the given path, or the default XDG config location,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        let mut config = if config_path.exists() {
            info!("loading config from {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents)
                .map_err(|e| RelayError::Config(format!("parse error: {e}")))?
        } else {
            if path.is_some() {
                return Err(RelayError::Config(format!(
                    "config file not found: {}",
                    config_path.display()
                )));
            }
            info!("no config file found, using defaults");
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from the environment (or any other key lookup).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("XAI_API_KEY") {
            self.upstream.api_key = key;
        }
        if let Some(url) = get("XAI_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(model) = get("XAI_MODEL") {
            self.upstream.model = model;
        }
        if let Some(bind) = get("RELAY_BIND") {
            self.bind = bind;
        }
    }

    /// The server-held upstream credential, if one is configured.
    pub fn api_key(&self) -> Option<String> {
        let key = self.upstream.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    /// Returns the default config file path: `$XDG_CONFIG_HOME/skillpack-relay/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("skillpack-relay")
            .join("config.toml")
    }

    /// Generate the default config file contents.
    pub fn default_config_contents() -> &'static str {
        include_str!("../config.example.toml")
    }
}
