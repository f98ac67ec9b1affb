//! Shared building blocks for Sableye: errors, configuration, logging,
//! note types and the collaborator traits skills are bound to.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod logging;
pub mod note;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use collaborators::{Collaborators, Embedder, LanguageModel, NoteReader, Unavailable, VectorIndex};
pub use config::{AgentConfig, Config, ConfigError, ModelConfig, ModelKind, SkillsConfig, VaultConfig};
pub use error::{Error, Result};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use note::{Chunk, Note, NoteMetadata};
