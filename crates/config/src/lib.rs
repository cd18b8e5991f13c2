//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; omitted from requests when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max tokens per model response; omitted from requests when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Timeout for one model call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Turn loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Session persistence
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-5-nano".into()
}
fn default_request_timeout() -> u64 {
    120
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("sessions", &self.sessions)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum tool rounds per turn before the turn fails
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Instructions prepended to every model request (never persisted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_tool_rounds() -> u32 {
    8
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// "sqlite", "jsonl" or "memory"
    #[serde(default = "default_sessions_backend")]
    pub backend: String,

    /// Database file (sqlite) or directory (jsonl). Defaults under the
    /// config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_sessions_backend() -> String {
    "sqlite".into()
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: default_sessions_backend(),
            path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_vantage_api_key: Option<String>,

    #[serde(default = "default_alpha_vantage_url")]
    pub alpha_vantage_url: String,

    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    #[serde(default = "default_search_region")]
    pub search_region: String,

    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,

    /// Timeout for each outbound tool request
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_alpha_vantage_url() -> String {
    "https://www.alphavantage.co".into()
}
fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com".into()
}
fn default_forecast_url() -> String {
    "https://api.open-meteo.com".into()
}
fn default_search_url() -> String {
    "https://api.duckduckgo.com".into()
}
fn default_search_region() -> String {
    "us-en".into()
}
fn default_max_search_results() -> usize {
    5
}
fn default_tool_timeout() -> u64 {
    10
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            alpha_vantage_url: default_alpha_vantage_url(),
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            search_url: default_search_url(),
            search_region: default_search_region(),
            max_search_results: default_max_search_results(),
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("alpha_vantage_api_key", &redact(&self.alpha_vantage_api_key))
            .field("alpha_vantage_url", &self.alpha_vantage_url)
            .field("geocoding_url", &self.geocoding_url)
            .field("forecast_url", &self.forecast_url)
            .field("search_url", &self.search_url)
            .field("search_region", &self.search_region)
            .field("max_search_results", &self.max_search_results)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PARLEY_API_KEY`, `OPENAI_API_KEY`, `OPENAI_KEY` (in that order)
    /// - `PARLEY_MODEL`, `PARLEY_BASE_URL`
    /// - `PARLEY_SESSIONS_PATH`
    /// - `ALPHA_VANTAGE_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply process environment overrides.
    pub fn load_with(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        // Env keys only fill in a missing file key
        if self.api_key.is_none() {
            self.api_key = get("PARLEY_API_KEY")
                .or_else(|| get("OPENAI_API_KEY"))
                .or_else(|| get("OPENAI_KEY"));
        }

        if let Some(model) = get("PARLEY_MODEL") {
            self.model = model;
        }

        if let Some(url) = get("PARLEY_BASE_URL") {
            self.base_url = url;
        }

        if let Some(path) = get("PARLEY_SESSIONS_PATH") {
            self.sessions.path = Some(path);
        }

        if self.tools.alpha_vantage_api_key.is_none() {
            self.tools.alpha_vantage_api_key = get("ALPHA_VANTAGE_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Where the session store lives.
    pub fn sessions_path(&self) -> PathBuf {
        match &self.sessions.path {
            Some(path) => PathBuf::from(path),
            None if self.sessions.backend == "jsonl" => Self::config_dir().join("sessions"),
            None => Self::config_dir().join("chatbot.db"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        if !matches!(self.sessions.backend.as_str(), "sqlite" | "jsonl" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown sessions.backend '{}' (expected sqlite, jsonl or memory)",
                self.sessions.backend
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: default_request_timeout(),
            agent: AgentSettings::default(),
            sessions: SessionsConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
