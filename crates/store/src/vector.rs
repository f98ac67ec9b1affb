//! In-memory vector index over note chunks.
//!
//! Chunks are embedded once at build time; queries are embedded on demand
//! and ranked by cosine similarity.

use std::sync::Arc;

use crate::{Error, Result};
use sableye_core::{Chunk, Embedder, VectorIndex};

/// Chunks embedded per backend request
pub const EMBED_BATCH_SIZE: usize = 64;

struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// A chunk with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is better)
    pub similarity: f64,
}

pub struct MemoryIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexedChunk>,
}

impl MemoryIndex {
    /// Embed `chunks` and build the index.
    pub async fn from_chunks(chunks: Vec<Chunk>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder.embed_documents(&texts).await.map_err(|e| Error::embedding(e.to_string()))?;
            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
            );
            tracing::debug!(embedded = entries.len(), total = chunks.len(), "embedding chunks");
        }

        Ok(Self { embedder, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` chunks by similarity to `query`, best first.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> sableye_core::Result<Vec<Chunk>> {
        let embedding = self.embedder.embed_query(query).await?;
        let hits = self.search_by_vector(&embedding, k);
        tracing::debug!(query, k, hits = hits.len(), "similarity search");
        Ok(hits.into_iter().map(|hit| hit.chunk).collect())
    }
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 { 0.0 } else { dot_product / denominator }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sableye_core::testing::note;

    /// Maps known words onto fixed axes.
    struct AxisEmbedder;

    #[async_trait::async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> sableye_core::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.matches("run").count() as f32,
                        t.matches("book").count() as f32,
                        t.matches("game").count() as f32,
                    ]
                })
                .collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait::async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_documents(&self, _texts: &[String]) -> sableye_core::Result<Vec<Vec<f32>>> {
            Ok(vec![])
        }
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            note("a.md", "2024-01-01T00:00:00", "Finished a book"),
            note("b.md", "2024-01-02T00:00:00", "Morning run, then another run"),
            note("c.md", "2024-01-03T00:00:00", "Played a game after a run"),
        ]
    }

    #[tokio::test]
    async fn test_similarity_search_ranks_and_limits() {
        let index = MemoryIndex::from_chunks(chunks(), Arc::new(AxisEmbedder)).await.unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.similarity_search("run", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.file_name, "b.md");
        assert_eq!(hits[1].metadata.file_name, "c.md");

        let hits = index.similarity_search("book", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].metadata.file_name, "a.md");
    }

    #[tokio::test]
    async fn test_zero_k_and_empty_index() {
        let index = MemoryIndex::from_chunks(chunks(), Arc::new(AxisEmbedder)).await.unwrap();
        assert!(index.similarity_search("run", 0).await.unwrap().is_empty());

        let empty = MemoryIndex::from_chunks(vec![], Arc::new(AxisEmbedder)).await.unwrap();
        assert!(empty.is_empty());
        assert!(empty.similarity_search("run", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch() {
        let result = MemoryIndex::from_chunks(chunks(), Arc::new(ShortEmbedder)).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0_f32, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < f64::EPSILON);

        let c = vec![0.0_f32, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < f64::EPSILON);

        let d = vec![1.0_f32, 1.0, 0.0];
        let similarity = cosine_similarity(&a, &d);
        assert!(similarity > 0.0 && similarity < 1.0);

        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }
}
