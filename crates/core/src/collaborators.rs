//! Narrow capability traits that skills are bound to.
//!
//! The skill registry only ever sees these traits. Concrete implementations
//! live in `sableye-providers` (language models, embedders) and
//! `sableye-store` (vault reader, vector index).

use std::sync::Arc;

use crate::note::{Chunk, Note};
use crate::{Error, Result};

/// Accepts a prompt and returns a completion.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String>;
}

/// Returns the `k` chunks most similar to a query.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Chunk>>;
}

/// Supplies notes from the vault.
#[async_trait::async_trait]
pub trait NoteReader: Send + Sync {
    /// Notes modified within the last `days` days.
    async fn read_recent_notes(&self, days: u32) -> Result<Vec<Note>>;

    /// Every non-empty note in the vault.
    async fn read_all_notes(&self) -> Result<Vec<Note>>;
}

/// Turns text into embedding vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::provider("embedding response contained no vectors"))
    }
}

/// The three handles every skill factory receives.
///
/// Cloning shares the same underlying instances.
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LanguageModel>,
    pub index: Arc<dyn VectorIndex>,
    pub reader: Arc<dyn NoteReader>,
}

impl Collaborators {
    pub fn new(llm: Arc<dyn LanguageModel>, index: Arc<dyn VectorIndex>, reader: Arc<dyn NoteReader>) -> Self {
        Self { llm, index, reader }
    }

    /// Handles that fail every call. Lets skills be instantiated for
    /// inspection without a configured model or vault.
    pub fn unavailable() -> Self {
        let handle = Arc::new(Unavailable);
        Self { llm: handle.clone(), index: handle.clone(), reader: handle }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Collaborator stand-in that reports itself as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait::async_trait]
impl LanguageModel for Unavailable {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Err(Error::Unavailable("language model".to_string()))
    }
}

#[async_trait::async_trait]
impl VectorIndex for Unavailable {
    async fn similarity_search(&self, _query: &str, _k: usize) -> Result<Vec<Chunk>> {
        Err(Error::Unavailable("vector index".to_string()))
    }
}

#[async_trait::async_trait]
impl NoteReader for Unavailable {
    async fn read_recent_notes(&self, _days: u32) -> Result<Vec<Note>> {
        Err(Error::Unavailable("note reader".to_string()))
    }

    async fn read_all_notes(&self) -> Result<Vec<Note>> {
        Err(Error::Unavailable("note reader".to_string()))
    }
}
