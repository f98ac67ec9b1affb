//! In-memory collaborators for tests.
//!
//! They return canned data and record every call so tests can assert on the
//! prompts and queries a skill produced.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::collaborators::{Collaborators, LanguageModel, NoteReader, VectorIndex};
use crate::note::{Chunk, Note, NoteMetadata};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build a note with the given file name, modification timestamp and content.
pub fn note(file_name: &str, modified_time: &str, content: &str) -> Note {
    Note::new(
        content,
        NoteMetadata {
            source: file_name.to_string(),
            file_name: file_name.to_string(),
            modified_time: modified_time.to_string(),
            created_time: modified_time.to_string(),
        },
    )
}

/// Language model that replays scripted replies, then echoes a fixed reply.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// A model that always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self { fallback: reply.into(), ..Self::default() }
    }

    /// A model whose every call fails with a provider error.
    pub fn failing(reason: impl Into<String>) -> FailingModel {
        FailingModel { reason: reason.into() }
    }

    /// Queue a reply to be returned before the fallback.
    pub fn then(self, reply: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Ok(reply.into()));
        self
    }

    /// Queue an error to be returned before the fallback.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Err(Error::provider(reason)));
        self
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        lock(&self.prompts).push(prompt.to_string());
        match lock(&self.replies).pop_front() {
            Some(reply) => reply,
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Language model that always fails.
#[derive(Debug, Clone)]
pub struct FailingModel {
    reason: String,
}

#[async_trait::async_trait]
impl LanguageModel for FailingModel {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Err(Error::provider(self.reason.clone()))
    }
}

/// Vector index over a fixed list of chunks, returned in insertion order.
#[derive(Debug, Default)]
pub struct StaticIndex {
    chunks: Vec<Chunk>,
    failure: Option<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticIndex {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks, ..Self::default() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::default() }
    }

    /// Every `(query, k)` pair received so far.
    pub fn queries(&self) -> Vec<(String, usize)> {
        lock(&self.queries).clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for StaticIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        lock(&self.queries).push((query.to_string(), k));
        if let Some(reason) = &self.failure {
            return Err(Error::store(reason.clone()));
        }
        Ok(self.chunks.iter().take(k).cloned().collect())
    }
}

/// Note reader over a fixed list of notes.
///
/// `read_recent_notes` returns every note regardless of the window and records
/// the requested window.
#[derive(Debug, Default)]
pub struct StaticReader {
    notes: Vec<Note>,
    failure: Option<String>,
    windows: Mutex<Vec<u32>>,
}

impl StaticReader {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes, ..Self::default() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self { failure: Some(reason.into()), ..Self::default() }
    }

    /// Every `days` window requested so far.
    pub fn windows(&self) -> Vec<u32> {
        lock(&self.windows).clone()
    }

    fn notes(&self) -> Result<Vec<Note>> {
        match &self.failure {
            Some(reason) => Err(Error::store(reason.clone())),
            None => Ok(self.notes.clone()),
        }
    }
}

#[async_trait::async_trait]
impl NoteReader for StaticReader {
    async fn read_recent_notes(&self, days: u32) -> Result<Vec<Note>> {
        lock(&self.windows).push(days);
        self.notes()
    }

    async fn read_all_notes(&self) -> Result<Vec<Note>> {
        self.notes()
    }
}

/// Bundle test doubles into a [`Collaborators`] set.
pub fn collaborators(
    llm: Arc<dyn LanguageModel>, index: Arc<dyn VectorIndex>, reader: Arc<dyn NoteReader>,
) -> Collaborators {
    Collaborators::new(llm, index, reader)
}
