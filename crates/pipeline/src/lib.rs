//! # Semalign Pipeline
//!
//! Composition point for semantic alignment: embeds the inputs, chooses between
//! single-shot and chunked alignment, and checks the result before returning it.
//!
//! ```text
//! left[], right[]
//!     │
//!     ├──> AlignOptions::validate (sizing, gap penalty)
//!     │
//!     ├──> EmbeddingTable (distinct tokens, bounded concurrency)
//!     │
//!     ├──> chunk_size = None ──> align
//!     │    chunk_size = N    ──> Chunker::plan ──> align per window (parallel)
//!     │                                         └─> stitch_all (in window order)
//!     │
//!     └──> coverage check ──> Alignment
//! ```

mod error;
mod options;
mod orchestrator;

pub use error::{PipelineError, Result};
pub use options::AlignOptions;
pub use orchestrator::{align_sequences, align_sequences_with};
