use crate::error::{EmbeddingError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const MAX_EMBED_CONCURRENCY: usize = 32;
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// How embedding requests are batched and throttled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedLimits {
    /// Batches allowed in flight at once
    pub concurrency: usize,
    /// Tokens per backend request
    pub batch_size: usize,
    /// Deadline for embedding the whole token set
    pub timeout: Option<Duration>,
}

impl Default for EmbedLimits {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_EMBED_CONCURRENCY,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            timeout: None,
        }
    }
}

impl EmbedLimits {
    /// Defaults with `SEMALIGN_EMBED_CONCURRENCY` applied
    #[must_use]
    pub fn from_env() -> Self {
        let raw = std::env::var("SEMALIGN_EMBED_CONCURRENCY").ok();
        Self {
            concurrency: parse_embed_concurrency(raw.as_deref(), DEFAULT_EMBED_CONCURRENCY),
            ..Self::default()
        }
    }

    /// Clamp values into their usable ranges
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            concurrency: self.concurrency.clamp(1, MAX_EMBED_CONCURRENCY),
            batch_size: self.batch_size.max(1),
            timeout: self.timeout,
        }
    }
}

pub fn parse_embed_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_EMBED_CONCURRENCY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedConcurrencySnapshot {
    pub limit: usize,
    pub in_flight: usize,
    /// Highest `in_flight` observed so far
    pub peak: usize,
}

/// Semaphore shared by the batches of one embedding run
#[derive(Debug, Clone)]
pub struct EmbedGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl EmbedGate {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_EMBED_CONCURRENCY);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn acquire(&self) -> Result<EmbedPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EmbeddingError::Join("embedding semaphore closed".to_string()))?;
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak.fetch_max(now, Ordering::Relaxed);
        Ok(EmbedPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> EmbedConcurrencySnapshot {
        EmbedConcurrencySnapshot {
            limit: self.limit,
            in_flight: self.in_flight.load(Ordering::Relaxed),
            peak: self.peak.load(Ordering::Relaxed),
        }
    }
}

pub struct EmbedPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for EmbedPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_embed_concurrency_defaults_and_clamps() {
        let default_value = DEFAULT_EMBED_CONCURRENCY;
        assert_eq!(parse_embed_concurrency(None, default_value), default_value);
        assert_eq!(parse_embed_concurrency(Some("   "), default_value), default_value);
        assert_eq!(parse_embed_concurrency(Some("2"), default_value), 2);
        assert_eq!(parse_embed_concurrency(Some("0"), default_value), 1);
        assert_eq!(
            parse_embed_concurrency(Some("999"), default_value),
            MAX_EMBED_CONCURRENCY
        );
        assert_eq!(parse_embed_concurrency(Some("abc"), default_value), default_value);
        assert_eq!(parse_embed_concurrency(Some(" 5 "), default_value), 5);
    }

    #[test]
    fn normalized_limits_are_usable() {
        let limits = EmbedLimits {
            concurrency: 0,
            batch_size: 0,
            timeout: None,
        }
        .normalized();
        assert_eq!(limits.concurrency, 1);
        assert_eq!(limits.batch_size, 1);
    }

    #[tokio::test]
    async fn permits_track_in_flight() {
        let gate = EmbedGate::new(2);
        let a = gate.acquire().await.unwrap();
        let b = gate.acquire().await.unwrap();
        assert_eq!(gate.snapshot().in_flight, 2);
        drop(a);
        drop(b);
        let snapshot = gate.snapshot();
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.peak, 2);
        assert_eq!(snapshot.limit, 2);
    }
}
