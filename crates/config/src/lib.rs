//! Configuration loading, validation, and management for DocRouter.
//!
//! Loads configuration from `~/.docrouter/config.toml` with environment
//! variable overrides. Validates all settings at startup. The API key is the
//! only value without a usable default: commands that need an oracle call
//! [`AppConfig::require_api_key`] before doing any work.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.docrouter/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the reasoning and embedding oracles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Embedding oracle configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Document chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Segment and tool retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Tree summarization
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Agent loop limits and timeouts
    #[serde(default)]
    pub agent: AgentLoopConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    2048
}

/// Redact a secret string for Debug output.
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
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("embedding", &self.embedding)
            .field("chunking", &self.chunking)
            .field("retrieval", &self.retrieval)
            .field("summary", &self.summary)
            .field("agent", &self.agent)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "openai" (any OpenAI-compatible `/embeddings` endpoint) or "hash"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Vector width of the offline hash embedder
    #[serde(default = "default_hash_dimensions")]
    pub hash_dimensions: usize,
}

fn default_embedding_provider() -> String {
    "openai".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_batch_size() -> usize {
    64
}
fn default_hash_dimensions() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            batch_size: default_embedding_batch_size(),
            hash_dimensions: default_hash_dimensions(),
        }
    }
}

impl EmbeddingConfig {
    /// Whether embeddings are computed locally, without any API key.
    pub fn is_local(&self) -> bool {
        self.provider == "hash"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum segment size in characters
    #[serde(default = "default_max_segment_size")]
    pub max_segment_size: usize,
}

fn default_max_segment_size() -> usize {
    1024
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_segment_size: default_max_segment_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Tools offered to the oracle per question
    #[serde(default = "default_tool_top_k")]
    pub tool_top_k: usize,

    /// Segments retrieved by each vector tool call
    #[serde(default = "default_segment_top_k")]
    pub segment_top_k: usize,
}

fn default_tool_top_k() -> usize {
    3
}
fn default_segment_top_k() -> usize {
    2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            tool_top_k: default_tool_top_k(),
            segment_top_k: default_segment_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Items merged by one summarization call
    #[serde(default = "default_fan_in")]
    pub fan_in: usize,

    /// Summarization calls in flight per reduce level
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_fan_in() -> usize {
    4
}
fn default_max_concurrency() -> usize {
    8
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            fan_in: default_fan_in(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLoopConfig {
    /// Reasoning steps allowed per question
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Extra attempts after a failed oracle call
    #[serde(default = "default_oracle_retries")]
    pub oracle_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_true")]
    pub parallel_tool_calls: bool,

    /// Override the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_turns() -> u32 {
    10
}
fn default_oracle_timeout_secs() -> u64 {
    120
}
fn default_tool_timeout_secs() -> u64 {
    180
}
fn default_oracle_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_true() -> bool {
    true
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            oracle_retries: default_oracle_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            parallel_tool_calls: true,
            system_prompt: None,
        }
    }
}

impl AgentLoopConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.docrouter/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `DOCROUTER_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
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

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("DOCROUTER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(provider) = std::env::var("DOCROUTER_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("DOCROUTER_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docrouter")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.chunking.max_segment_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.max_segment_size must be > 0".into(),
            ));
        }
        if self.retrieval.tool_top_k == 0 || self.retrieval.segment_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.tool_top_k and retrieval.segment_top_k must be > 0".into(),
            ));
        }
        if self.summary.fan_in < 2 {
            return Err(ConfigError::ValidationError(
                "summary.fan_in must be at least 2".into(),
            ));
        }
        if self.summary.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "summary.max_concurrency must be > 0".into(),
            ));
        }
        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be > 0".into(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }
        if !matches!(self.embedding.provider.as_str(), "openai" | "hash")
            && !self.providers.contains_key(&self.embedding.provider)
        {
            return Err(ConfigError::ValidationError(format!(
                "embedding.provider '{}' is neither 'openai', 'hash' nor a configured provider",
                self.embedding.provider
            )));
        }
        Ok(())
    }

    /// The API key for a provider: its own key first, then the global one.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Fail fast when no credential is available for the default provider.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key_for(&self.default_provider)
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            embedding: EmbeddingConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            summary: SummaryConfig::default(),
            agent: AgentLoopConfig::default(),
            providers: HashMap::new(),
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

    #[error("No API key configured: set DOCROUTER_API_KEY or OPENAI_API_KEY, or add api_key to config.toml")]
    MissingApiKey,
}
