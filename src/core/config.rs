//! Configuration management for the bot.
//!
//! Handles loading configuration from TOML files and overlaying secrets
//! from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::chunk::{DEFAULT_CHUNK_SIZE, DISCORD_MESSAGE_LIMIT};
use super::topic::MAX_TOPICS;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Discord application settings
    pub discord: DiscordConfig,

    /// Search provider settings
    pub search: SearchConfig,

    /// Generative-text provider settings
    pub ai: AiConfig,

    /// Session lifecycle settings
    pub session: SessionConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Discord application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Hex-encoded Ed25519 public key used to verify interactions
    pub public_key: Option<String>,

    /// Bot token for channel posts and command registration
    pub bot_token: Option<String>,

    /// Application ID (webhook edits and command registration)
    pub application_id: Option<String>,

    /// Channel receiving the daily scout report
    pub channel_id: Option<String>,

    /// REST API base URL
    pub api_base: String,

    /// Timeout for each REST call, in seconds
    pub timeout_secs: u64,

    /// Maximum characters per outgoing message
    pub chunk_size: usize,
}

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// SerpAPI key
    pub api_key: Option<String>,

    /// SerpAPI endpoint
    pub base_url: String,

    /// Per-query deadline, in seconds
    pub timeout_secs: u64,

    /// Maximum simultaneous searches
    pub max_concurrency: usize,

    /// Predefined queries offered as daily topics
    pub queries: Vec<String>,
}

/// Generative-text provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider name (gemini, ollama)
    pub provider: String,

    /// API key (gemini)
    pub api_key: Option<String>,

    /// Model to use
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Deadline for one generation, in seconds
    pub timeout_secs: u64,
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds after its last write before a session expires
    pub ttl_secs: u64,

    /// Seconds between sweeps of expired sessions
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            bot_token: None,
            application_id: None,
            channel_id: None,
            api_base: "https://discord.com/api/v10".to_string(),
            timeout_secs: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://serpapi.com/search.json".to_string(),
            timeout_secs: 25,
            max_concurrency: 2,
            queries: vec![
                "AI music production tools".to_string(),
                "new audio plugins for producers".to_string(),
                "beat making techniques".to_string(),
                "mixing and mastering tips".to_string(),
            ],
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 * 60, sweep_interval_secs: 60 }
    }
}

impl ServerConfig {
    /// Get the socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DiscordConfig {
    /// REST call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchConfig {
    /// Per-query deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AiConfig {
    /// Generation deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SessionConfig {
    /// Session time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `soundswap.toml` in current directory
    /// 2. `~/.config/soundswap/config.toml`
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied on top in every case.
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from("soundswap.toml");
        let mut config = if local_config.exists() {
            Self::load_from_file(&local_config)?
        } else if let Some(global_config) =
            Self::config_dir().map(|d| d.join("config.toml")).filter(|p| p.exists())
        {
            Self::load_from_file(&global_config)?
        } else {
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load a specific file, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from environment variables.
    pub fn apply_env(&mut self) {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        if let Some(v) = var("DISCORD_PUBLIC_KEY") {
            self.discord.public_key = Some(v);
        }
        if let Some(v) = var("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = Some(v);
        }
        if let Some(v) = var("DISCORD_APP_ID") {
            self.discord.application_id = Some(v);
        }
        if let Some(v) = var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = Some(v);
        }
        if let Some(v) = var("SERPAPI_KEY") {
            self.search.api_key = Some(v);
        }
        if let Some(v) = var("GEMINI_API_KEY") {
            self.ai.api_key = Some(v);
        }
        if let Some(v) = var("SOUNDSWAP_HOST") {
            self.server.host = v;
        }
        if let Some(port) = var("SOUNDSWAP_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.discord.chunk_size == 0 || self.discord.chunk_size > DISCORD_MESSAGE_LIMIT {
            anyhow::bail!(
                "discord.chunk_size must be between 1 and {}, got {}",
                DISCORD_MESSAGE_LIMIT,
                self.discord.chunk_size
            );
        }
        if self.search.max_concurrency == 0 {
            anyhow::bail!("search.max_concurrency must be at least 1");
        }
        if self.search.queries.is_empty() {
            anyhow::bail!("search.queries must not be empty");
        }
        if self.search.queries.len() > MAX_TOPICS {
            anyhow::bail!(
                "search.queries allows at most {} entries, got {}",
                MAX_TOPICS,
                self.search.queries.len()
            );
        }
        Ok(())
    }

    /// Copy of this configuration with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|_| "***".to_string())
        }

        let mut config = self.clone();
        config.discord.public_key = mask(&self.discord.public_key);
        config.discord.bot_token = mask(&self.discord.bot_token);
        config.search.api_key = mask(&self.search.api_key);
        config.ai.api_key = mask(&self.ai.api_key);
        config
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("soundswap"))
    }
}
