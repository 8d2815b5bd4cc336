//! # Semalign Chunker
//!
//! Splits two long token sequences into overlapping windows that are aligned
//! independently and stitched back together.
//!
//! ```text
//! index   0 1 2 3 4 5 6 7 8 9
//! win 0   [-----]
//! win 1       [-----]            step = chunk_size - overlap
//! win 2           [-----]
//! win 3               [-----]    last window clipped to the input
//! ```
//!
//! Windows are laid over the shared range `0..max(|left|, |right|)` and each
//! side is clipped to its own length.
//!
//! ## Example
//!
//! ```rust
//! use semalign_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(4).with_overlap(2)).unwrap();
//! let plan = chunker.plan(10, 7);
//! assert_eq!(plan.len(), 4);
//! assert_eq!(plan[3].left, 6..10);
//! assert_eq!(plan[3].right, 6..7);
//! ```

mod chunker;
mod config;
mod error;

pub use chunker::{windows, Chunker, WindowPair, WindowSlices};
pub use config::{ChunkerConfig, MAX_DEFAULT_OVERLAP};
pub use error::{ChunkerError, Result};
