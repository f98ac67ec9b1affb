//! Vault storage for Sableye: reading notes from disk, splitting them into
//! chunks and serving similarity search over their embeddings.
//!
//! # Example
//!
//! ```ignore
//! use sableye_store::{Indexer, TextSplitter, VaultReader};
//!
//! let reader = Arc::new(VaultReader::new(&vault_path)?);
//! let indexer = Indexer::new(reader, TextSplitter::new(1000, 200)?, embedder);
//! let (index, summary) = indexer.build(90).await?;
//! let hits = index.similarity_search("running goals", 5).await?;
//! ```

mod error;
mod indexer;
mod reader;
mod splitter;
mod vector;

pub use error::{Error, Result};
pub use indexer::{IndexSummary, Indexer};
pub use reader::VaultReader;
pub use splitter::{DEFAULT_SEPARATORS, TextSplitter};
pub use vector::{EMBED_BATCH_SIZE, MemoryIndex, ScoredChunk, cosine_similarity};
