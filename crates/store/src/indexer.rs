//! Builds the vector index from the vault.
//!
//! Notes are loaded through a [`NoteReader`], split into chunks and
//! embedded into a [`MemoryIndex`].

use std::sync::Arc;

use crate::{Error, MemoryIndex, Result, TextSplitter};
use sableye_core::{Embedder, NoteReader};

/// Outcome of an indexing run
#[derive(Debug, Clone, Default)]
pub struct IndexSummary {
    /// Notes loaded from the vault
    pub documents: usize,
    /// Chunks embedded into the index
    pub chunks: usize,
    /// Recency window used, `None` for the whole vault
    pub days: Option<u32>,
    /// Duration of the indexing run
    pub duration_ms: u64,
}

impl IndexSummary {
    /// "last 30 days" or "all days"
    pub fn window(&self) -> String {
        match self.days {
            Some(days) => format!("last {} days", days),
            None => "all days".to_string(),
        }
    }
}

pub struct Indexer {
    reader: Arc<dyn NoteReader>,
    splitter: TextSplitter,
    embedder: Arc<dyn Embedder>,
}

impl Indexer {
    pub fn new(reader: Arc<dyn NoteReader>, splitter: TextSplitter, embedder: Arc<dyn Embedder>) -> Self {
        Self { reader, splitter, embedder }
    }

    /// Load notes from the last `load_days` days (`0` loads every note)
    /// and index them.
    #[tracing::instrument(skip(self))]
    pub async fn build(&self, load_days: u32) -> Result<(MemoryIndex, IndexSummary)> {
        let start = std::time::Instant::now();
        tracing::info!("loading notes from vault");

        let days = (load_days > 0).then_some(load_days);
        let notes = match days {
            Some(days) => self.reader.read_recent_notes(days).await,
            None => self.reader.read_all_notes().await,
        }
        .map_err(|e| Error::Read(e.to_string()))?;

        if notes.is_empty() {
            return Err(Error::NoDocuments);
        }

        let chunks = self.splitter.split_notes(&notes);
        let chunk_count = chunks.len();
        let index = MemoryIndex::from_chunks(chunks, self.embedder.clone()).await?;

        let summary = IndexSummary {
            documents: notes.len(),
            chunks: chunk_count,
            days,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Loaded {} documents ({} chunks) from {} in {}ms",
            summary.documents,
            summary.chunks,
            summary.window(),
            summary.duration_ms
        );

        Ok((index, summary))
    }
}
