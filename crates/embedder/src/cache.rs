use crate::embeddings::Embedder;
use crate::error::{EmbeddingError, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// In-memory LRU cache of token vectors in front of another embedder.
///
/// Only tokens missing from the cache reach the inner backend, once per batch.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut found: Vec<Option<Vec<f32>>> = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            texts.iter().map(|text| cache.get(text).cloned()).collect()
        };

        let mut seen = HashSet::new();
        let missing: Vec<String> = texts
            .iter()
            .zip(&found)
            .filter(|(text, hit)| hit.is_none() && seen.insert(*text))
            .map(|(text, _)| text.clone())
            .collect();

        let hits = found.iter().filter(|slot| slot.is_some()).count();
        self.hits.fetch_add(hits, Ordering::Relaxed);
        self.misses.fetch_add(missing.len(), Ordering::Relaxed);

        if !missing.is_empty() {
            log::debug!(
                "Embedding cache: {} of {} tokens need the backend",
                missing.len(),
                texts.len()
            );
            let vectors = self.inner.embed_batch(&missing).await?;
            let fresh: HashMap<String, Vec<f32>> = missing.into_iter().zip(vectors).collect();
            {
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                for (text, vector) in &fresh {
                    cache.put(text.clone(), vector.clone());
                }
            }
            for (slot, text) in found.iter_mut().zip(texts) {
                if slot.is_none() {
                    *slot = fresh.get(text).cloned();
                }
            }
        }

        found
            .into_iter()
            .zip(texts)
            .map(|(slot, text)| slot.ok_or_else(|| EmbeddingError::UnknownToken(text.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::StubEmbedder;
    use std::sync::Arc;

    struct Counting {
        inner: StubEmbedder,
        calls: Arc<AtomicUsize>,
        texts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Embedder for Counting {
        fn model_id(&self) -> &str {
            "counting"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.texts.fetch_add(texts.len(), Ordering::Relaxed);
            self.inner.embed_batch(texts).await
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn repeated_tokens_hit_the_backend_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let texts = Arc::new(AtomicUsize::new(0));
        let cached = CachedEmbedder::new(
            Counting {
                inner: StubEmbedder::new(8),
                calls: calls.clone(),
                texts: texts.clone(),
            },
            16,
        );

        let first = cached.embed_batch(&strings(&["a", "b", "a"])).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], first[2]);
        assert_eq!(texts.load(Ordering::Relaxed), 2);

        let second = cached.embed_batch(&strings(&["b", "a"])).await.unwrap();
        assert_eq!(second, vec![first[1].clone(), first[0].clone()]);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(cached.hits(), 2);
        assert_eq!(cached.misses(), 2);
        assert_eq!(cached.model_id(), "counting");
    }

    #[tokio::test]
    async fn capacity_bounds_the_cache() {
        let cached = CachedEmbedder::new(StubEmbedder::new(4), 2);
        let vectors = cached.embed_batch(&strings(&["a", "b", "c"])).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 4));
        assert_eq!(cached.len(), 2);
    }
}
