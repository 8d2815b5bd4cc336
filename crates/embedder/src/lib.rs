//! # Semalign Embedder
//!
//! Turns tokens into vectors for the semantic distance used by the aligner.
//!
//! ## Architecture
//!
//! ```text
//! tokens (left ∪ right)
//!     │
//!     ├──> dedup + batches of `batch_size`
//!     │
//!     ├──> EmbedGate (semaphore, `concurrency` permits, optional deadline)
//!     │      └─> CachedEmbedder (LRU)
//!     │            └─> OllamaEmbedder | StubEmbedder | FixedEmbedder
//!     │
//!     └──> EmbeddingTable
//!            └─> cosine distance per token pair
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use semalign_embedder::{EmbedLimits, EmbeddingTable, OllamaConfig, OllamaEmbedder};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embedder = Arc::new(OllamaEmbedder::new(OllamaConfig::from_env())?);
//!     let table = EmbeddingTable::build(embedder, ["dog", "cat"], EmbedLimits::from_env()).await?;
//!     println!("dog/cat distance: {:.3}", table.distance("dog", "cat", 1.0));
//!     Ok(())
//! }
//! ```

mod backend;
mod cache;
mod embeddings;
mod error;
mod limits;
mod ollama;
mod table;

pub use backend::create_embedder;
pub use cache::{CachedEmbedder, DEFAULT_CACHE_CAPACITY};
pub use embeddings::{
    cosine_distance, Embedder, EmbeddingMode, FixedEmbedder, StubEmbedder, STUB_DIMENSION,
};
pub use error::{EmbeddingError, Result};
pub use limits::{
    parse_embed_concurrency, EmbedConcurrencySnapshot, EmbedGate, EmbedLimits, EmbedPermit,
    DEFAULT_EMBED_BATCH_SIZE, DEFAULT_EMBED_CONCURRENCY, MAX_EMBED_CONCURRENCY,
};
pub use ollama::{OllamaConfig, OllamaEmbedder, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
pub use table::EmbeddingTable;
