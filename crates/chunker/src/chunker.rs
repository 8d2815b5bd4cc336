use crate::config::ChunkerConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One window over both inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPair {
    /// Position of the window in the plan
    pub index: usize,

    /// Shared index range before clipping
    pub span: Range<usize>,

    /// `span` clipped to the left input
    pub left: Range<usize>,

    /// `span` clipped to the right input
    pub right: Range<usize>,
}

impl WindowPair {
    fn clipped(index: usize, span: Range<usize>, left_len: usize, right_len: usize) -> Self {
        let clip = |len: usize| span.start.min(len)..span.end.min(len);
        Self {
            index,
            left: clip(left_len),
            right: clip(right_len),
            span,
        }
    }
}

/// Borrowed slices of both inputs selected by a [`WindowPair`]
#[derive(Debug, Clone, Copy)]
pub struct WindowSlices<'a, T> {
    pub window: &'a WindowPair,
    pub left: &'a [T],
    pub right: &'a [T],
}

/// Successive windows of `chunk_size` over `0..len`, each starting
/// `chunk_size - overlap` after the previous one. The last window is clipped to
/// `len` and planning stops once a window reaches it.
///
/// Callers are expected to pass a validated configuration; a non-advancing step
/// is bumped to 1 so the plan always terminates.
#[must_use]
pub fn windows(len: usize, chunk_size: usize, overlap: usize) -> Vec<Range<usize>> {
    let size = chunk_size.max(1);
    let step = size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + size).min(len);
        out.push(start..end);
        if end == len {
            break;
        }
        start += step;
    }
    out
}

/// Plans overlapping windows over a pair of sequences
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting degenerate window sizing
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.config.resolved_overlap()
    }

    /// Windows over `0..max(left_len, right_len)`, clipped to each side
    #[must_use]
    pub fn plan(&self, left_len: usize, right_len: usize) -> Vec<WindowPair> {
        let n = left_len.max(right_len);
        let plan: Vec<_> = windows(n, self.config.chunk_size, self.overlap())
            .into_iter()
            .enumerate()
            .map(|(index, span)| WindowPair::clipped(index, span, left_len, right_len))
            .collect();

        log::debug!(
            "Planned {} windows over {n} indices (chunk_size={}, overlap={})",
            plan.len(),
            self.config.chunk_size,
            self.overlap()
        );
        plan
    }

    /// Pair each planned window with the slices it selects
    pub fn split<'a, T>(
        &self,
        plan: &'a [WindowPair],
        left: &'a [T],
        right: &'a [T],
    ) -> impl Iterator<Item = WindowSlices<'a, T>> {
        plan.iter().map(move |window| WindowSlices {
            window,
            left: &left[window.left.clone()],
            right: &right[window.right.clone()],
        })
    }
}
