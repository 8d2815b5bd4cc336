use crate::cache::CachedEmbedder;
use crate::embeddings::{Embedder, EmbeddingMode, StubEmbedder};
use crate::error::Result;
use crate::ollama::{OllamaConfig, OllamaEmbedder};
use std::sync::Arc;

/// Build the embedder for `mode`, fronted by an LRU cache of `cache_capacity` tokens
pub fn create_embedder(
    mode: EmbeddingMode,
    ollama: OllamaConfig,
    cache_capacity: usize,
) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match mode {
        EmbeddingMode::Stub => {
            Arc::new(CachedEmbedder::new(StubEmbedder::default(), cache_capacity))
        }
        EmbeddingMode::Ollama => {
            log::debug!("Using Ollama model '{}' at {}", ollama.model, ollama.endpoint);
            Arc::new(CachedEmbedder::new(OllamaEmbedder::new(ollama)?, cache_capacity))
        }
    };
    Ok(embedder)
}
