use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sableye-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by every Sableye crate
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Language model or embedding provider errors
    #[error("provider error: {0}")]
    Provider(String),

    /// Vector index and vault errors
    #[error("store error: {0}")]
    Store(String),

    /// Skill loading and tool errors
    #[error("skill error: {0}")]
    Skill(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator was required but never supplied
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider error with a message
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a store error with a message
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a skill error with a message
    pub fn skill(msg: impl Into<String>) -> Self {
        Self::Skill(msg.into())
    }

    /// Create an error for a path that should exist but does not
    pub fn missing_path(what: &str, path: &PathBuf) -> Self {
        Self::Config(format!("{} does not exist: {}", what, path.display()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML parse error: {}", err))
    }
}
