//! Configuration management for docqa.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.docqa/config.yaml` in the workspace, or `DOCQA_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: relative paths (docs directory,
//! index file) resolve against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Embedding providers understood by the knowledge crate.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "hash"];

/// Completion providers understood by the llm crate.
pub const LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Markdown corpus directory (relative to the workspace unless absolute)
    pub docs_dir: PathBuf,

    /// SQLite vector index file (relative to the workspace unless absolute)
    pub index_path: PathBuf,

    /// Explicit API key, overrides the per-provider key variables
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub embedding: EmbeddingSettings,

    pub llm: LlmSettings,

    pub chunking: ChunkingSettings,

    pub retrieval: RetrievalSettings,

    pub server: ServerSettings,
}

/// Embedding provider settings. The same model must serve ingest and query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name ("openai", "ollama", "hash")
    pub provider: String,

    /// Model identifier pinned for both ingestion and querying
    pub model: String,

    /// Custom endpoint (provider default when unset)
    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    pub api_key_env: String,

    /// Texts per embedding request during ingestion
    pub batch_size: usize,

    /// Vector dimension for the local hash provider
    pub dimensions: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            batch_size: 100,
            dimensions: 384,
            timeout_secs: 30,
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider name ("openai", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Custom endpoint (provider default when unset)
    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    pub api_key_env: String,

    /// Sampling temperature; kept low so answers stay grounded
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: None,
            timeout_secs: 30,
        }
    }
}

/// Chunker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters, heading prefix included
    pub max_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chars: 1500 }
    }
}

/// Retrieval and context assembly settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Top-k used when a request does not specify one
    pub default_top_k: usize,

    /// Largest top-k a request may ask for
    pub max_top_k: usize,

    /// Upper bound on the context block handed to the LLM, in characters
    pub max_context_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 20,
            max_context_chars: 8000,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            rate_limit: RateLimitSettings::default(),
        }
    }
}

/// Per-client request allowances for the HTTP API, counted over a
/// one-minute window per remote address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Applies to `/retrieve` and `/debug-query`
    pub retrieve_per_minute: u32,
    /// Applies to `/query`
    pub query_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            retrieve_per_minute: 30,
            query_per_minute: 10,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    docs: Option<DocsConfig>,
    index: Option<IndexConfig>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    chunking: Option<ChunkingSettings>,
    retrieval: Option<RetrievalSettings>,
    server: Option<ServerSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocsConfig {
    dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            docs_dir: PathBuf::from("docs"),
            index_path: PathBuf::from(".docqa/index.sqlite"),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the
    /// environment. Explicit workspace/config-file paths (typically CLI
    /// flags) win over their environment variables.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_DOCS_DIR`: Markdown corpus directory
    /// - `DOCQA_API_KEY`: API key used for every provider
    /// - `EMBEDDING_MODEL`: Embedding model identifier
    /// - `COMPLETION_MODEL`: Completion model identifier
    /// - `CORS_ORIGINS`: Comma-separated allowed origins
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load_with(None, None).expect("Failed to load config");
    /// println!("Docs: {:?}", config.docs_path());
    /// ```
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("DOCQA_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("DOCQA_CONFIG"));

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        config.apply_env();

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(docs_dir) = env_path("DOCQA_DOCS_DIR") {
            self.docs_dir = docs_dir;
        }

        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(model) = std::env::var("COMPLETION_MODEL") {
            self.llm.model = model;
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Ok(key) = std::env::var("DOCQA_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        // Check for NO_COLOR environment variable
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(dir) = config_file.docs.and_then(|d| d.dir) {
            result.docs_dir = PathBuf::from(dir);
        }

        if let Some(path) = config_file.index.and_then(|i| i.path) {
            result.index_path = PathBuf::from(path);
        }

        // Merge logging settings
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the
    /// config file.
    pub fn with_overrides(
        mut self,
        docs_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(docs_dir) = docs_dir {
            self.docs_dir = docs_dir;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
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

    /// Get the path to the .docqa state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(".docqa")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .docqa directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the markdown corpus.
    pub fn docs_path(&self) -> PathBuf {
        self.resolve(&self.docs_dir)
    }

    /// Absolute path of the SQLite vector index.
    pub fn index_file(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Resolve the API key for the embedding provider.
    pub fn embedding_api_key(&self) -> Option<String> {
        self.resolve_api_key(&self.embedding.api_key_env)
    }

    /// Resolve the API key for the completion provider.
    pub fn llm_api_key(&self) -> Option<String> {
        self.resolve_api_key(&self.llm.api_key_env)
    }

    fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        // Check explicit DOCQA_API_KEY first
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        std::env::var(env_var).ok().filter(|k| !k.is_empty())
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.provider == "openai" && self.embedding_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.embedding.api_key_env
            )));
        }

        if self.llm.provider == "openai" && self.llm_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.llm.api_key_env
            )));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.batchSize must be at least 1".to_string(),
            ));
        }

        if self.chunking.max_chars == 0 {
            return Err(AppError::Config(
                "chunking.maxChars must be at least 1".to_string(),
            ));
        }

        let retrieval = &self.retrieval;
        if retrieval.default_top_k == 0 || retrieval.default_top_k > retrieval.max_top_k {
            return Err(AppError::Config(format!(
                "retrieval.defaultTopK must be between 1 and {}",
                retrieval.max_top_k
            )));
        }

        let limits = &self.server.rate_limit;
        if limits.enabled && (limits.retrieve_per_minute == 0 || limits.query_per_minute == 0) {
            return Err(AppError::Config(
                "server.rateLimit allowances must be at least 1 (set enabled: false to turn limiting off)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().map(PathBuf::from)
}
