//! Configuration management
//!
//! This module handles loading and validation of the Sage configuration.
//! Configuration is stored in TOML format at ~/.sage/config.toml; a missing
//! file means "all defaults", which is a fully working setup as long as the
//! completion API key is present in the environment.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, workspace path for the file tool
//! - **llm**: Completion service endpoint and model
//! - **conversation**: Session store bounds and timeouts
//! - **retrieval**: Retrieval service endpoint and fetch size
//! - **agent**: Tool loop ceiling
//! - **tools**: Tool enablement flags and web endpoints

use crate::conversation::StoreConfig;
use chrono::Duration;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Completion service configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Conversation store configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Retrieval service configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Tool loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool enablement
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Workspace directory the file tool is allowed to touch
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Gemini REST API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name (e.g., "gemini-1.5-pro")
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Conversation store configuration
///
/// Field meanings match `conversation::StoreConfig`; durations are in
/// minutes here because that is the natural unit for a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of sessions held in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Minutes of inactivity before a session expires
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: i64,

    /// Maximum messages kept per session (FIFO trim beyond this)
    #[serde(default = "default_max_messages_per_session")]
    pub max_messages_per_session: usize,

    /// Character budget for the assembled conversation context
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,

    /// Minutes after which a follow-up message starts a new session
    #[serde(default = "default_consecutive_timeout_minutes")]
    pub consecutive_timeout_minutes: i64,
}

/// Retrieval service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Endpoint of the retrieval service; `None` disables retrieval
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Number of candidates to fetch per query
    #[serde(default = "default_retrieval_k")]
    pub k: usize,

    /// Relevance threshold (cosine distance, lower is better)
    #[serde(default = "default_relevance_threshold")]
    pub threshold: f64,

    /// Minimum documents to keep whenever any candidate exists
    #[serde(default = "default_min_docs")]
    pub min_docs: usize,
}

/// Tool loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of executed tool calls per query
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: usize,
}

/// Tool enablement and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub calculator: bool,

    #[serde(default = "default_true")]
    pub clock: bool,

    #[serde(default = "default_true")]
    pub general_knowledge: bool,

    #[serde(default = "default_true")]
    pub personal_knowledge: bool,

    #[serde(default = "default_true")]
    pub web_search: bool,

    #[serde(default = "default_true")]
    pub weather: bool,

    #[serde(default = "default_true")]
    pub url_fetch: bool,

    #[serde(default = "default_true")]
    pub file_operations: bool,

    /// DuckDuckGo Instant Answer endpoint
    #[serde(default = "default_web_search_endpoint")]
    pub web_search_endpoint: String,

    /// OpenWeatherMap current-conditions endpoint
    #[serde(default = "default_weather_endpoint")]
    pub weather_endpoint: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    300
}

fn default_max_sessions() -> usize {
    100
}

fn default_session_timeout_minutes() -> i64 {
    30
}

fn default_max_messages_per_session() -> usize {
    50
}

fn default_max_context_length() -> usize {
    4000
}

fn default_consecutive_timeout_minutes() -> i64 {
    5
}

fn default_retrieval_k() -> usize {
    5
}

fn default_relevance_threshold() -> f64 {
    1.5
}

fn default_min_docs() -> usize {
    1
}

fn default_max_tool_calls() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_web_search_endpoint() -> String {
    "https://api.duckduckgo.com".to_string()
}

fn default_weather_endpoint() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            workspace: default_workspace(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            session_timeout_minutes: default_session_timeout_minutes(),
            max_messages_per_session: default_max_messages_per_session(),
            max_context_length: default_max_context_length(),
            consecutive_timeout_minutes: default_consecutive_timeout_minutes(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            k: default_retrieval_k(),
            threshold: default_relevance_threshold(),
            min_docs: default_min_docs(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: default_max_tool_calls(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            calculator: true,
            clock: true,
            general_knowledge: true,
            personal_knowledge: true,
            web_search: true,
            weather: true,
            url_fetch: true,
            file_operations: true,
            web_search_endpoint: default_web_search_endpoint(),
            weather_endpoint: default_weather_endpoint(),
        }
    }
}

impl Config {
    /// Default configuration file location: ~/.sage/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sage")
            .join("config.toml")
    }

    /// Load configuration from the default location, or fall back to
    /// defaults when the file does not exist.
    pub fn load_or_default() -> Result<Self, EngineError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.agent.max_tool_calls == 0 {
            return Err(EngineError::Config(
                "agent.max_tool_calls must be at least 1".to_string(),
            ));
        }
        if self.conversation.max_messages_per_session == 0 {
            return Err(EngineError::Config(
                "conversation.max_messages_per_session must be at least 1".to_string(),
            ));
        }
        if self.conversation.session_timeout_minutes <= 0
            || self.conversation.consecutive_timeout_minutes <= 0
        {
            return Err(EngineError::Config(
                "conversation timeouts must be positive".to_string(),
            ));
        }
        if self.retrieval.min_docs == 0 {
            return Err(EngineError::Config(
                "retrieval.min_docs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConversationConfig {
    /// Convert the file representation (minutes) into the store's
    /// duration-based configuration.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_sessions: self.max_sessions,
            session_timeout: Duration::minutes(self.session_timeout_minutes),
            max_messages_per_session: self.max_messages_per_session,
            max_context_length: self.max_context_length,
            consecutive_timeout: Duration::minutes(self.consecutive_timeout_minutes),
        }
    }
}
