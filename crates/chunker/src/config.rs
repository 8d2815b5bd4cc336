use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the overlap picked when none is configured
pub const MAX_DEFAULT_OVERLAP: usize = 4;

/// Window sizing for chunked alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Width of every window, in indices of the longer input
    pub chunk_size: usize,

    /// Indices shared by consecutive windows.
    /// Defaults to `min(4, chunk_size / 2)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_size: Option<usize>,
}

impl ChunkerConfig {
    pub const fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size: None,
        }
    }

    #[must_use]
    pub const fn with_overlap(mut self, overlap_size: usize) -> Self {
        self.overlap_size = Some(overlap_size);
        self
    }

    /// Overlap after applying the default
    pub fn resolved_overlap(&self) -> usize {
        self.overlap_size
            .unwrap_or_else(|| MAX_DEFAULT_OVERLAP.min(self.chunk_size / 2))
    }

    /// Distance between the starts of consecutive windows
    pub fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.resolved_overlap())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }

        let overlap = self.resolved_overlap();
        if overlap == 0 {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_size must be > 0 (chunk_size {} resolves to no overlap)",
                self.chunk_size
            )));
        }

        if overlap >= self.chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_size ({overlap}) must be smaller than chunk_size ({})",
                self.chunk_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_overlap_is_half_capped_at_four() {
        assert_eq!(ChunkerConfig::new(2).resolved_overlap(), 1);
        assert_eq!(ChunkerConfig::new(5).resolved_overlap(), 2);
        assert_eq!(ChunkerConfig::new(8).resolved_overlap(), 4);
        assert_eq!(ChunkerConfig::new(100).resolved_overlap(), 4);
        assert_eq!(ChunkerConfig::new(100).with_overlap(10).resolved_overlap(), 10);
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::new(10).validate().is_ok());
        assert!(ChunkerConfig::new(10).with_overlap(9).validate().is_ok());

        // Zero width
        assert!(ChunkerConfig::new(0).validate().is_err());

        // Size 1 resolves to zero overlap
        assert!(ChunkerConfig::new(1).validate().is_err());

        // Explicit zero overlap
        assert!(ChunkerConfig::new(10).with_overlap(0).validate().is_err());

        // Overlap must stay below the window width
        let err = ChunkerConfig::new(4).with_overlap(4).validate().unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));
        assert!(ChunkerConfig::new(4).with_overlap(7).validate().is_err());
    }

    #[test]
    fn overlap_is_optional_in_json() {
        let config: ChunkerConfig = serde_json::from_str(r#"{"chunk_size": 6}"#).unwrap();
        assert_eq!(config, ChunkerConfig::new(6));
        assert_eq!(config.step(), 3);
        assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"chunk_size":6}"#);
    }
}
