use crate::error::{PipelineError, Result};
use semalign_aligner::{validate_gap_penalty, DEFAULT_GAP_PENALTY};
use semalign_chunker::ChunkerConfig;
use semalign_embedder::{
    EmbedLimits, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_EMBED_CONCURRENCY, MAX_EMBED_CONCURRENCY,
};
use std::time::Duration;

/// Caller-supplied sizing for one alignment run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignOptions {
    /// Cost of leaving one token unpaired
    pub gap_penalty: f64,

    /// Window width; `None` aligns in one shot
    pub chunk_size: Option<usize>,

    /// Indices shared by consecutive windows; `None` picks `min(4, chunk_size / 2)`
    pub overlap_size: Option<usize>,

    pub embed_concurrency: usize,
    pub embed_batch_size: usize,
    pub embed_timeout: Option<Duration>,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            gap_penalty: DEFAULT_GAP_PENALTY,
            chunk_size: None,
            overlap_size: None,
            embed_concurrency: DEFAULT_EMBED_CONCURRENCY,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            embed_timeout: None,
        }
    }
}

impl AlignOptions {
    #[must_use]
    pub fn chunked(chunk_size: usize, overlap_size: Option<usize>) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            overlap_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_gap_penalty(mut self, gap_penalty: f64) -> Self {
        self.gap_penalty = gap_penalty;
        self
    }

    /// Window configuration when running chunked
    #[must_use]
    pub const fn chunker_config(&self) -> Option<ChunkerConfig> {
        match self.chunk_size {
            Some(chunk_size) => Some(ChunkerConfig {
                chunk_size,
                overlap_size: self.overlap_size,
            }),
            None => None,
        }
    }

    #[must_use]
    pub const fn embed_limits(&self) -> EmbedLimits {
        EmbedLimits {
            concurrency: self.embed_concurrency,
            batch_size: self.embed_batch_size,
            timeout: self.embed_timeout,
        }
    }

    /// Reject malformed sizing before any work starts
    pub fn validate(&self) -> Result<()> {
        validate_gap_penalty(self.gap_penalty)?;

        match self.chunker_config() {
            Some(config) => config.validate()?,
            None if self.overlap_size.is_some() => {
                return Err(PipelineError::invalid_input(
                    "overlap_size requires chunk_size",
                ));
            }
            None => {}
        }

        if self.embed_concurrency == 0 || self.embed_concurrency > MAX_EMBED_CONCURRENCY {
            return Err(PipelineError::invalid_input(format!(
                "embed_concurrency must be within 1..={MAX_EMBED_CONCURRENCY}, got {}",
                self.embed_concurrency
            )));
        }
        if self.embed_batch_size == 0 {
            return Err(PipelineError::invalid_input("embed_batch_size must be > 0"));
        }
        if self.embed_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PipelineError::invalid_input("embed_timeout must be > 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_single_shot() {
        let options = AlignOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.chunker_config().is_none());
        assert_eq!(options.gap_penalty, 0.1);
    }

    #[test]
    fn sizing_errors_are_invalid_input() {
        let cases = [
            AlignOptions::chunked(4, Some(4)),
            AlignOptions::chunked(4, Some(0)),
            AlignOptions::chunked(0, None),
            AlignOptions::chunked(1, None),
            AlignOptions {
                overlap_size: Some(2),
                ..AlignOptions::default()
            },
            AlignOptions::default().with_gap_penalty(0.0),
            AlignOptions::default().with_gap_penalty(-0.5),
            AlignOptions {
                embed_batch_size: 0,
                ..AlignOptions::default()
            },
            AlignOptions {
                embed_concurrency: 0,
                ..AlignOptions::default()
            },
        ];
        for options in cases {
            let err = options.validate().unwrap_err();
            assert_eq!(err.code(), "invalid_input", "{options:?}");
        }
    }

    #[test]
    fn chunked_options_resolve_default_overlap() {
        let config = AlignOptions::chunked(6, None).chunker_config().unwrap();
        assert_eq!(config.resolved_overlap(), 3);
    }
}
