//! Configuration loading, validation, and management for Docent.
//!
//! Loads configuration from `~/.docent/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docent/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature for answers
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval index settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session lifecycle settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Quiz synthesis settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "mistral".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
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
            .field("generation", &self.generation)
            .field("retrieval", &self.retrieval)
            .field("session", &self.session)
            .field("quiz", &self.quiz)
            .field("gateway", &self.gateway)
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
pub struct GenerationConfig {
    /// Upper bound on a single backend call, 0 = no limit
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_generation_timeout(),
        }
    }
}

/// How the retrieval index ranks passages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Term overlap only; needs no embedding model
    #[default]
    Keyword,
    /// Cosine similarity over provider embeddings
    Vector,
    /// Reciprocal rank fusion of both
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub mode: RetrievalMode,

    /// Embedding model used in `vector` and `hybrid` modes
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Files or directories to index
    #[serde(default)]
    pub corpus_paths: Vec<String>,

    /// File extensions picked up when walking directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_top_k() -> usize {
    3
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into(), "pdf".into()]
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            mode: RetrievalMode::default(),
            embedding_model: default_embedding_model(),
            corpus_paths: vec![],
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted (0 = never)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How often the idle reaper runs
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// Active sessions kept before the least recently used one is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Input that ends a session and triggers the quiz
    #[serde(default = "default_end_keyword")]
    pub end_keyword: String,
}

fn default_idle_timeout() -> u64 {
    1800
}
fn default_reap_interval() -> u64 {
    60
}
fn default_max_sessions() -> usize {
    1_000
}
fn default_end_keyword() -> String {
    "exit".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            reap_interval_secs: default_reap_interval(),
            max_sessions: default_max_sessions(),
            end_keyword: default_end_keyword(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_question_count")]
    pub question_count: usize,

    #[serde(default = "default_option_count")]
    pub option_count: usize,

    /// Lower than the answer temperature so the JSON stays well-formed
    #[serde(default = "default_quiz_temperature")]
    pub temperature: f32,
}

fn default_question_count() -> usize {
    5
}
fn default_option_count() -> usize {
    4
}
fn default_quiz_temperature() -> f32 {
    0.3
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            option_count: default_option_count(),
            temperature: default_quiz_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: vec![],
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.docent/config.toml).
    ///
    /// Also checks environment variables:
    /// - `DOCENT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `DOCENT_PROVIDER`, `DOCENT_MODEL`
    /// - `DOCENT_CORPUS` (path-separator delimited list of corpus paths)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("DOCENT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("DOCENT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("DOCENT_MODEL") {
            if let Some(provider) = config.providers.get_mut(&config.default_provider) {
                provider.default_model = None;
            }
            config.default_model = model;
        }

        if let Some(corpus) = std::env::var_os("DOCENT_CORPUS") {
            config.retrieval.corpus_paths = std::env::split_paths(&corpus)
                .map(|p| p.display().to_string())
                .collect();
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, t) in [
            ("default_temperature", self.default_temperature),
            ("quiz.temperature", self.quiz.temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0"
                )));
            }
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.retrieval.chunk_size == 0
            || self.retrieval.chunk_overlap >= self.retrieval.chunk_size
        {
            return Err(ConfigError::ValidationError(
                "retrieval.chunk_overlap must be smaller than a non-zero chunk_size".into(),
            ));
        }

        if self.session.end_keyword.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.end_keyword must not be empty".into(),
            ));
        }

        if self.session.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_sessions must be at least 1".into(),
            ));
        }

        if self.quiz.question_count == 0 || self.quiz.option_count < 2 {
            return Err(ConfigError::ValidationError(
                "quiz needs at least one question and two options".into(),
            ));
        }

        Ok(())
    }

    /// The model to request: the default provider's own `default_model` if
    /// set, else the top-level one.
    pub fn active_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
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
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            session: SessionConfig::default(),
            quiz: QuizConfig::default(),
            gateway: GatewayConfig::default(),
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
}
