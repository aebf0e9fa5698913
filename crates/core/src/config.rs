//! Configuration management for the advisor service.
//!
//! This module loads and merges configuration from multiple sources:
//! - Environment variables
//! - An optional YAML config file (`advisor.yaml`)
//! - Command-line flags (applied by the CLI via `with_overrides`)
//!
//! The result is an immutable snapshot constructed once at startup and passed
//! by reference into each component constructor. Re-reading configuration
//! requires a restart, never live mutation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Every tunable of the query pipeline lives here: provider priority order,
/// per-resource rate limits, session TTL and capacity, retrieval parameters,
/// and guard signature extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the curated knowledge documents
    pub knowledge_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Provider priority order, tried first-to-last on each query
    pub provider_order: Vec<String>,

    /// API key for the Hugging Face backend
    pub huggingface_api_key: Option<String>,

    /// Model served through the Hugging Face backend
    pub huggingface_model: String,

    /// API key for the OpenAI backend
    pub openai_api_key: Option<String>,

    /// Model served through the OpenAI backend
    pub openai_model: String,

    /// Per-attempt generation timeout in seconds
    pub llm_timeout_secs: u64,

    /// Maximum tokens per generation
    pub llm_max_tokens: u32,

    /// Sampling temperature
    pub llm_temperature: f32,

    /// Rate-limit window length in seconds
    pub rate_window_secs: u64,

    /// Query admissions allowed per client per window
    pub query_limit_per_window: u32,

    /// Profile-upload admissions allowed per client per window
    pub upload_limit_per_window: u32,

    /// Session time-to-live in seconds
    pub session_ttl_secs: u64,

    /// Hard cap on concurrently held sessions
    pub max_sessions: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// Minimum retrieval score; below it a query gets no grounding context
    pub min_score: f32,

    /// Maximum chunk length in characters
    pub max_chunk_len: usize,

    /// Paragraphs shorter than this are not indexed
    pub min_chunk_len: usize,

    /// Extra exfiltration signatures merged with the built-in set
    pub extra_guard_signatures: Vec<String>,

    /// Extra output leak markers merged with the built-in set
    pub extra_leak_markers: Vec<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure (`advisor.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    providers: Option<ProvidersSection>,
    limits: Option<LimitsSection>,
    sessions: Option<SessionsSection>,
    retrieval: Option<RetrievalSection>,
    guard: Option<GuardSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProvidersSection {
    order: Option<Vec<String>>,
    #[serde(rename = "huggingfaceModel")]
    huggingface_model: Option<String>,
    #[serde(rename = "openaiModel")]
    openai_model: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LimitsSection {
    #[serde(rename = "windowSecs")]
    window_secs: Option<u64>,
    #[serde(rename = "queryPerWindow")]
    query_per_window: Option<u32>,
    #[serde(rename = "uploadPerWindow")]
    upload_per_window: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionsSection {
    #[serde(rename = "ttlSecs")]
    ttl_secs: Option<u64>,
    #[serde(rename = "maxSessions")]
    max_sessions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "minScore")]
    min_score: Option<f32>,
    #[serde(rename = "maxChunkLen")]
    max_chunk_len: Option<usize>,
    #[serde(rename = "minChunkLen")]
    min_chunk_len: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GuardSection {
    signatures: Option<Vec<String>>,
    #[serde(rename = "leakMarkers")]
    leak_markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from("knowledge_base"),
            config_file: None,
            provider_order: vec!["huggingface".to_string(), "openai".to_string()],
            huggingface_api_key: None,
            huggingface_model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            llm_timeout_secs: 90,
            llm_max_tokens: 900,
            llm_temperature: 0.25,
            rate_window_secs: 60,
            query_limit_per_window: 30,
            upload_limit_per_window: 10,
            session_ttl_secs: 3600,
            max_sessions: 500,
            top_k: 4,
            min_score: 0.5,
            max_chunk_len: 900,
            min_chunk_len: 80,
            extra_guard_signatures: Vec::new(),
            extra_leak_markers: Vec::new(),
            log_level: None,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `ADVISOR_KNOWLEDGE_DIR`: Directory of knowledge documents
    /// - `ADVISOR_CONFIG`: Path to config file
    /// - `ADVISOR_PROVIDER_ORDER`: Comma-separated provider priority list
    /// - `HUGGINGFACE_API_KEY`, `HF_MODEL_NAME`
    /// - `OPENAI_API_KEY`, `OPENAI_MODEL`
    /// - `LLM_TIMEOUT_SECONDS`, `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`
    /// - `RATE_LIMIT_WINDOW_SEC`, `RATE_LIMIT_QUERY_PER_WINDOW`,
    ///   `RATE_LIMIT_UPLOAD_PER_WINDOW`
    /// - `SESSION_TTL_SEC`, `MAX_SESSIONS`
    /// - `ADVISOR_TOP_K`, `ADVISOR_MIN_SCORE`
    /// - `RUST_LOG`, `NO_COLOR`
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("ADVISOR_KNOWLEDGE_DIR") {
            config.knowledge_dir = PathBuf::from(dir);
        }

        if let Ok(config_file) = std::env::var("ADVISOR_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists; env vars override it below.
        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("advisor.yaml"));
        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(order) = std::env::var("ADVISOR_PROVIDER_ORDER") {
            config.provider_order = parse_provider_order(&order);
        }

        config.huggingface_api_key = non_empty_env("HUGGINGFACE_API_KEY");
        config.openai_api_key = non_empty_env("OPENAI_API_KEY");

        if let Ok(model) = std::env::var("HF_MODEL_NAME") {
            config.huggingface_model = model;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.openai_model = model;
        }

        parse_env_into("LLM_TIMEOUT_SECONDS", &mut config.llm_timeout_secs)?;
        parse_env_into("LLM_MAX_TOKENS", &mut config.llm_max_tokens)?;
        parse_env_into("LLM_TEMPERATURE", &mut config.llm_temperature)?;
        parse_env_into("RATE_LIMIT_WINDOW_SEC", &mut config.rate_window_secs)?;
        parse_env_into(
            "RATE_LIMIT_QUERY_PER_WINDOW",
            &mut config.query_limit_per_window,
        )?;
        parse_env_into(
            "RATE_LIMIT_UPLOAD_PER_WINDOW",
            &mut config.upload_limit_per_window,
        )?;
        parse_env_into("SESSION_TTL_SEC", &mut config.session_ttl_secs)?;
        parse_env_into("MAX_SESSIONS", &mut config.max_sessions)?;
        parse_env_into("ADVISOR_TOP_K", &mut config.top_k)?;
        parse_env_into("ADVISOR_MIN_SCORE", &mut config.min_score)?;

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(providers) = config_file.providers {
            if let Some(order) = providers.order {
                result.provider_order = order;
            }
            if let Some(model) = providers.huggingface_model {
                result.huggingface_model = model;
            }
            if let Some(model) = providers.openai_model {
                result.openai_model = model;
            }
            if let Some(timeout) = providers.timeout_secs {
                result.llm_timeout_secs = timeout;
            }
            if let Some(max_tokens) = providers.max_tokens {
                result.llm_max_tokens = max_tokens;
            }
            if let Some(temperature) = providers.temperature {
                result.llm_temperature = temperature;
            }
        }

        if let Some(limits) = config_file.limits {
            if let Some(window) = limits.window_secs {
                result.rate_window_secs = window;
            }
            if let Some(limit) = limits.query_per_window {
                result.query_limit_per_window = limit;
            }
            if let Some(limit) = limits.upload_per_window {
                result.upload_limit_per_window = limit;
            }
        }

        if let Some(sessions) = config_file.sessions {
            if let Some(ttl) = sessions.ttl_secs {
                result.session_ttl_secs = ttl;
            }
            if let Some(max) = sessions.max_sessions {
                result.max_sessions = max;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(min_score) = retrieval.min_score {
                result.min_score = min_score;
            }
            if let Some(len) = retrieval.max_chunk_len {
                result.max_chunk_len = len;
            }
            if let Some(len) = retrieval.min_chunk_len {
                result.min_chunk_len = len;
            }
        }

        if let Some(guard) = config_file.guard {
            if let Some(signatures) = guard.signatures {
                result.extra_guard_signatures = signatures;
            }
            if let Some(markers) = guard.leak_markers {
                result.extra_leak_markers = markers;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    pub fn with_overrides(
        mut self,
        knowledge_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider_order: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dir) = knowledge_dir {
            self.knowledge_dir = dir;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(order) = provider_order {
            self.provider_order = parse_provider_order(&order);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate the snapshot before the engine is built from it.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["huggingface", "openai", "static"];

        if self.provider_order.is_empty() {
            return Err(AppError::Config(
                "Provider order must name at least one backend".to_string(),
            ));
        }

        for provider in &self.provider_order {
            if !known_providers.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    known_providers.join(", ")
                )));
            }
        }

        if self.max_sessions == 0 {
            return Err(AppError::Config(
                "MAX_SESSIONS must be at least 1".to_string(),
            ));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        if self.max_chunk_len <= self.min_chunk_len {
            return Err(AppError::Config(
                "max_chunk_len must exceed min_chunk_len".to_string(),
            ));
        }

        Ok(())
    }
}

/// Split a comma-separated provider list, dropping empty entries.
fn parse_provider_order(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read an env var, treating whitespace-only values as unset.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an env var into a target, erroring on malformed values.
fn parse_env_into<T: std::str::FromStr>(key: &str, target: &mut T) -> AppResult<()> {
    if let Ok(raw) = std::env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", key, raw)))?;
    }
    Ok(())
}
