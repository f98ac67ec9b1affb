use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File consulted before `config.toml` when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "config.local.toml";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Which backend serves the language model and embeddings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// OpenAI-compatible chat completions API (default)
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// Scripted responses for offline use and tests
    Mock,
}

impl ModelKind {
    pub const VALUES: &[ModelKind] = &[ModelKind::OpenAi, ModelKind::Ollama, ModelKind::Mock];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::OpenAi => "openai",
            ModelKind::Ollama => "ollama",
            ModelKind::Mock => "mock",
        }
    }

    /// Base URL used when `model.base_url` is not set
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ModelKind::OpenAi => "https://api.openai.com/v1",
            ModelKind::Ollama => "http://localhost:11434",
            ModelKind::Mock => "",
        }
    }

    /// Embedding model used when `model.embedding_model` is not set
    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            ModelKind::OpenAi => "text-embedding-ada-002",
            ModelKind::Ollama => "nomic-embed-text",
            ModelKind::Mock => "hashing",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ModelKind::OpenAi),
            "ollama" => Ok(ModelKind::Ollama),
            "mock" => Ok(ModelKind::Mock),
            _ => Err(Error::Config(ConfigError::InvalidModelKind(s.to_string()).to_string())),
        }
    }
}

/// `[model]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Backend: "openai", "ollama" or "mock"
    #[serde(rename = "type")]
    pub kind: ModelKind,
    /// Chat model name
    pub name: String,
    /// API key (required for openai)
    pub api_key: Option<String>,
    /// Override for the backend base URL
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Override for the embedding model name
    pub embedding_model: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// TOML file with scripted replies (mock only)
    pub responses_file: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::default(),
            name: "gpt-4".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: 2000,
            embedding_model: None,
            timeout_secs: 120,
            responses_file: None,
        }
    }
}

impl ModelConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_embedding_model())
    }
}

/// `[vault]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Root of the markdown vault
    pub path: Option<PathBuf>,
    /// Only index notes modified in the last N days (0 indexes everything)
    pub load_days: u32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { path: None, load_days: 90, chunk_size: 1000, chunk_overlap: 200 }
    }
}

/// `[agent]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub verbose: bool,
    /// Model round trips allowed per user message
    pub max_iterations: usize,
    /// `k` used by the `search_notes` tool
    pub search_results_limit: usize,
    /// Messages of chat history sent with each request
    pub history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { verbose: false, max_iterations: 5, search_results_limit: 5, history_limit: 10 }
    }
}

/// `[skills]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsConfig {
    /// Load manifest skills from `dirs`
    pub enabled: bool,
    /// Directories scanned for `<name>.md` skill manifests, in priority order
    pub dirs: Vec<PathBuf>,
    /// Directory whose `<skill>.md` files replace the built-in prompt templates
    pub prompts_dir: Option<PathBuf>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self { enabled: true, dirs: vec![default_skills_dir()], prompts_dir: None }
    }
}

fn default_skills_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sableye")
        .join("skills")
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Default filter for stderr output
    pub level: String,
    /// "pretty", "json" or "compact"
    pub format: String,
    /// Also write JSON logs to `~/.sableye/logs`
    pub file: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "pretty".to_string(), file: false }
    }
}

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    pub vault: VaultConfig,
    pub agent: AgentConfig,
    pub skills: SkillsConfig,
    pub logging: LoggingSection,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).map_err(ConfigError::from).map_err(Error::from)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Pick the config file to read.
    ///
    /// An explicit path always wins. Otherwise `config.local.toml` is used when
    /// it exists in `dir`, falling back to `config.toml`.
    pub fn resolve_path(explicit: Option<&Path>, dir: &Path) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        let local = dir.join(LOCAL_CONFIG_FILE);
        if local.exists() { local } else { dir.join(DEFAULT_CONFIG_FILE) }
    }

    /// Resolve, read and apply environment overrides.
    ///
    /// A missing file yields the defaults; an explicit path that does not
    /// exist is an error.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<(Self, PathBuf)> {
        let path = Self::resolve_path(explicit, dir);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            return Err(Error::missing_path("Config file", &path));
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok((config, path))
    }

    /// Apply `OPENAI_API_KEY`, `OBSIDIAN_VAULT_PATH`, `MODEL_TYPE` and
    /// `MODEL_NAME` overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.model.api_key = Some(key);
        }
        if let Some(path) = lookup("OBSIDIAN_VAULT_PATH").filter(|v| !v.is_empty()) {
            self.vault.path = Some(PathBuf::from(path));
        }
        if let Some(kind) = lookup("MODEL_TYPE").filter(|v| !v.is_empty()) {
            self.model.kind = kind.parse()?;
        }
        if let Some(name) = lookup("MODEL_NAME").filter(|v| !v.is_empty()) {
            self.model.name = name;
        }
        Ok(())
    }

    /// Validate the configuration and normalise the vault path.
    ///
    /// The vault path is expanded (`~`) and canonicalised in place.
    pub fn validate(&mut self) -> Result<()> {
        let raw = self
            .vault
            .path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::Config(ConfigError::VaultPathNotConfigured.to_string()))?;

        let expanded = expand_home(raw);
        if !expanded.exists() {
            return Err(Error::Config(ConfigError::VaultPathMissing(expanded).to_string()));
        }
        self.vault.path = Some(expanded.canonicalize()?);

        if self.model.kind == ModelKind::OpenAi && self.model.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config(ConfigError::ApiKeyRequired.to_string()));
        }

        if self.vault.chunk_size == 0 {
            return Err(Error::Config(ConfigError::InvalidValue("vault.chunk_size must be > 0".into()).to_string()));
        }
        if self.vault.chunk_overlap >= self.vault.chunk_size {
            return Err(Error::Config(
                ConfigError::InvalidValue("vault.chunk_overlap must be smaller than vault.chunk_size".into()).to_string(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(Error::Config(
                ConfigError::InvalidValue("agent.max_iterations must be > 0".into()).to_string(),
            ));
        }

        Ok(())
    }

    /// The validated vault root.
    pub fn vault_path(&self) -> Result<&Path> {
        self.vault
            .path
            .as_deref()
            .ok_or_else(|| Error::Config(ConfigError::VaultPathNotConfigured.to_string()))
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Sableye Configuration Example
# Copy this file to config.toml (or config.local.toml) and customize as needed

[model]
# Backend: "openai", "ollama" or "mock"
type = "openai"
name = "gpt-4"
# Required for openai; OPENAI_API_KEY overrides it
api_key = "your-api-key-here"
# base_url = "http://localhost:11434"
temperature = 0.7
max_tokens = 2000
# embedding_model = "nomic-embed-text"
timeout_secs = 120
# responses_file = "mock_responses.toml"

[vault]
# Root of your notes; OBSIDIAN_VAULT_PATH overrides it
path = "~/Documents/Obsidian/Journal"
# Index notes modified in the last N days (0 = all notes)
load_days = 90
chunk_size = 1000
chunk_overlap = 200

[agent]
verbose = false
max_iterations = 5
search_results_limit = 5
history_limit = 10

[skills]
enabled = true
# Directories holding <name>.md skill manifests
dirs = ["~/.sableye/skills"]
# Directory of <skill>.md files replacing the built-in prompt templates
# prompts_dir = "prompts"

[logging]
level = "warn"
format = "pretty"
file = false
"#
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Vault path not configured")]
    VaultPathNotConfigured,

    #[error("Vault path does not exist: {}", .0.display())]
    VaultPathMissing(PathBuf),

    #[error("OpenAI API key required for openai model type")]
    ApiKeyRequired,

    #[error("invalid model type: {0} (expected openai, ollama or mock)")]
    InvalidModelKind(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
