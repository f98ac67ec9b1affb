//! Error types for the vault store

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or indexing the vault
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vault directory is missing
    #[error("Vault path does not exist: {}", .0.display())]
    VaultNotFound(PathBuf),

    /// Note reader failure
    #[error("Failed to read notes: {0}")]
    Read(String),

    /// Nothing to index
    #[error("No documents found in vault")]
    NoDocuments,

    /// Splitter settings that cannot produce chunks
    #[error("Invalid splitter settings: {0}")]
    InvalidSplitter(String),

    /// Embedding backend failure
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Blocking task failed to complete
    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }
}

impl From<Error> for sableye_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => sableye_core::Error::Io(e),
            Error::VaultNotFound(_) | Error::InvalidSplitter(_) => sableye_core::Error::Config(err.to_string()),
            other => sableye_core::Error::Store(other.to_string()),
        }
    }
}
