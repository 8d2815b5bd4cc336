//! # Semalign Aligner
//!
//! Minimum-cost alignment of two token sequences and reconciliation of
//! independently aligned windows into one global alignment.
//!
//! ## Architecture
//!
//! ```text
//! left[], right[], distance(a, b)
//!     │
//!     ├──> DP Aligner (cost matrix + backpointers)
//!     │      └─> Alignment of one window
//!     │
//!     └──> Stitcher (left fold over windows)
//!            ├─> canonical anchor in the head window
//!            ├─> compatible anchor in the tail window
//!            ├─> gap-block tolerant merge, stops at first conflict
//!            └─> Accumulator with frozen boundary
//! ```
//!
//! ## Example
//!
//! ```rust
//! use semalign_aligner::{align, stitch_all, AlignedRow};
//!
//! let left = vec!["dog".to_string(), "house".to_string()];
//! let right = vec!["dog".to_string(), "home".to_string()];
//! let rows = align(&left, &right, 0.8, |a, b| if a == b { 0.0 } else { 0.5 }).unwrap();
//! assert_eq!(rows[0], AlignedRow::matched("dog", "dog"));
//!
//! let stitched = stitch_all([rows.clone()], 2).unwrap();
//! assert_eq!(stitched, rows);
//! ```

mod dp;
mod error;
mod stitcher;
mod types;

pub use dp::{align, validate_gap_penalty, DEFAULT_GAP_PENALTY};
pub use error::{AlignerError, Result};
pub use stitcher::{canonical_anchor, stitch_all, stitch_two, Accumulator, JoinOutcome, Splice};
pub use types::{
    gap_blocks, left_projection, right_projection, verify_coverage, AlignedRow, Alignment, Chunk,
    Side, Token,
};
