//! Notes and chunks exchanged between the vault, the vector index and skills.

use serde::{Deserialize, Serialize};

/// Metadata carried by every note and chunk.
///
/// All fields are always present. Timestamps are ISO-8601 strings and may be
/// empty when the filesystem could not report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    /// Path of the note relative to the vault root
    pub source: String,
    /// File name including extension
    pub file_name: String,
    /// Last modification time (ISO-8601)
    pub modified_time: String,
    /// Creation time (ISO-8601)
    pub created_time: String,
}

impl NoteMetadata {
    /// First ten characters of the modification time (the calendar date).
    pub fn modified_date(&self) -> &str {
        date_prefix(&self.modified_time)
    }

    /// File name, or `Unknown` when empty.
    pub fn display_name(&self) -> &str {
        if self.file_name.is_empty() { "Unknown" } else { &self.file_name }
    }
}

/// A note read from the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub content: String,
    pub metadata: NoteMetadata,
}

/// A slice of a note returned by the vector index. Carries the note's metadata.
pub type Chunk = Note;

impl Note {
    pub fn new(content: impl Into<String>, metadata: NoteMetadata) -> Self {
        Self { content: content.into(), metadata }
    }

    /// Build a chunk of this note that keeps its metadata.
    pub fn slice(&self, content: impl Into<String>) -> Chunk {
        Self { content: content.into(), metadata: self.metadata.clone() }
    }
}

fn date_prefix(timestamp: &str) -> &str {
    match timestamp.char_indices().nth(10) {
        Some((idx, _)) => &timestamp[..idx],
        None => timestamp,
    }
}
