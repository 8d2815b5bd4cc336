use crate::embeddings::{cosine_distance, Embedder};
use crate::error::{EmbeddingError, Result};
use crate::limits::{EmbedConcurrencySnapshot, EmbedGate, EmbedLimits};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Vectors for every distinct token of an alignment run
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl EmbeddingTable {
    /// Embed each distinct token once.
    ///
    /// Tokens are split into batches of `limits.batch_size`; at most
    /// `limits.concurrency` batches are in flight. When `limits.timeout` elapses
    /// the remaining batches are cancelled and the whole build fails.
    pub async fn build<'a, I>(
        embedder: Arc<dyn Embedder>,
        tokens: I,
        limits: EmbedLimits,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::build_with_stats(embedder, tokens, limits)
            .await
            .map(|(table, _)| table)
    }

    /// Same as [`build`](Self::build), also reporting how many batches ran concurrently
    pub async fn build_with_stats<'a, I>(
        embedder: Arc<dyn Embedder>,
        tokens: I,
        limits: EmbedLimits,
    ) -> Result<(Self, EmbedConcurrencySnapshot)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let limits = limits.normalized();
        let gate = EmbedGate::new(limits.concurrency);

        let mut seen = HashSet::new();
        let distinct: Vec<String> = tokens
            .into_iter()
            .filter(|token| seen.insert(*token))
            .map(str::to_string)
            .collect();

        if distinct.is_empty() {
            return Ok((Self::default(), gate.snapshot()));
        }

        let batch_count = distinct.len().div_ceil(limits.batch_size);
        log::info!(
            "Embedding {} distinct tokens via {} ({batch_count} batches, concurrency {})",
            distinct.len(),
            embedder.model_id(),
            limits.concurrency
        );

        let mut tasks = JoinSet::new();
        for (index, batch) in distinct.chunks(limits.batch_size).enumerate() {
            let batch = batch.to_vec();
            let embedder = embedder.clone();
            let gate = gate.clone();
            tasks.spawn(async move {
                let _permit = gate.acquire().await?;
                log::debug!("Embedding batch {index} ({} tokens)", batch.len());
                let vectors = embedder.embed_batch(&batch).await?;
                Ok::<_, EmbeddingError>((batch, vectors))
            });
        }

        let collected = match limits.timeout {
            Some(limit) => tokio::time::timeout(limit, collect(&mut tasks))
                .await
                .map_err(|_| EmbeddingError::Timeout(limit))?,
            None => collect(&mut tasks).await,
        };
        // Cancels whatever is still running after a failure or timeout
        tasks.abort_all();

        let table = Self::from_batches(collected?)?;
        Ok((table, gate.snapshot()))
    }

    fn from_batches(batches: Vec<(Vec<String>, Vec<Vec<f32>>)>) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut dimension = None;

        for (batch, embeddings) in batches {
            if embeddings.len() != batch.len() {
                return Err(EmbeddingError::backend(format!(
                    "backend returned {} vectors for {} tokens",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (token, vector) in batch.into_iter().zip(embeddings) {
                let expected = *dimension.get_or_insert(vector.len());
                if vector.len() != expected || expected == 0 {
                    return Err(EmbeddingError::InvalidDimension {
                        expected,
                        actual: vector.len(),
                    });
                }
                vectors.insert(token, vector);
            }
        }

        Ok(Self {
            vectors,
            dimension: dimension.unwrap_or(0),
        })
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Cosine distance between two tokens; a token without a vector costs `missing`
    #[must_use]
    pub fn distance(&self, a: &str, b: &str, missing: f64) -> f64 {
        match (self.get(a), self.get(b)) {
            (Some(va), Some(vb)) => cosine_distance(va, vb),
            _ => missing,
        }
    }
}

async fn collect(
    tasks: &mut JoinSet<Result<(Vec<String>, Vec<Vec<f32>>)>>,
) -> Result<Vec<(Vec<String>, Vec<Vec<f32>>)>> {
    let mut batches = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let batch = joined.map_err(|e| EmbeddingError::Join(e.to_string()))??;
        batches.push(batch);
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{FixedEmbedder, StubEmbedder};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Slow;

    #[async_trait]
    impl Embedder for Slow {
        fn model_id(&self) -> &str {
            "slow"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct Short;

    #[async_trait]
    impl Embedder for Short {
        fn model_id(&self) -> &str {
            "short"
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    #[tokio::test]
    async fn embeds_each_distinct_token_once() {
        let tokens = ["dog", "cat", "dog", "house", "cat"];
        let limits = EmbedLimits {
            concurrency: 2,
            batch_size: 1,
            timeout: None,
        };
        let (table, stats) =
            EmbeddingTable::build_with_stats(Arc::new(StubEmbedder::new(16)), tokens, limits)
                .await
                .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.dimension(), 16);
        assert!(stats.peak <= 2);
        assert_eq!(stats.in_flight, 0);
        assert!(table.distance("dog", "dog", 0.5).abs() < 1e-6);
        assert_eq!(table.distance("dog", "unknown", 0.5), 0.5);
    }

    #[tokio::test]
    async fn empty_token_set_needs_no_backend() {
        let embedder = Arc::new(FixedEmbedder::new());
        let table = EmbeddingTable::build(embedder, [], EmbedLimits::default())
            .await
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.dimension(), 0);
    }

    #[tokio::test]
    async fn backend_failure_aborts_the_build() {
        let fixed = FixedEmbedder::new().with("dog", vec![1.0, 0.0]);
        let err = EmbeddingTable::build(Arc::new(fixed), ["dog", "cat"], EmbedLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::UnknownToken(_)));
    }

    #[tokio::test]
    async fn mixed_dimensions_are_rejected() {
        let fixed = FixedEmbedder::new()
            .with("dog", vec![1.0, 0.0])
            .with("cat", vec![1.0, 0.0, 0.0]);
        let err = EmbeddingTable::build(Arc::new(fixed), ["dog", "cat"], EmbedLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidDimension { .. }));
    }

    #[tokio::test]
    async fn short_backend_response_is_an_error() {
        let err = EmbeddingTable::build(Arc::new(Short), ["a", "b"], EmbedLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Backend(_)));
    }

    #[tokio::test]
    async fn timeout_cancels_the_build() {
        let limits = EmbedLimits {
            concurrency: 1,
            batch_size: 1,
            timeout: Some(Duration::from_millis(5)),
        };
        let err = EmbeddingTable::build(Arc::new(Slow), ["a", "b", "c"], limits)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Timeout(_)));
    }
}
