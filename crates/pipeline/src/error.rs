use semalign_aligner::AlignerError;
use semalign_chunker::ChunkerError;
use semalign_embedder::EmbeddingError;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rejected before any work started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid input: {0}")]
    Chunker(#[from] ChunkerError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The produced alignment is unusable; indicates a bug in the core
    #[error("Alignment invariant violated: {0}")]
    AlignmentInvariant(String),

    #[error("Alignment task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable machine-readable code for error envelopes
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::Chunker(_) => "invalid_input",
            Self::Embedding(_) => "embedding_failed",
            Self::AlignmentInvariant(_) => "alignment_invariant",
            Self::Task(_) => "internal",
        }
    }
}

impl From<AlignerError> for PipelineError {
    fn from(err: AlignerError) -> Self {
        match err {
            AlignerError::InvalidInput(msg) => Self::InvalidInput(msg),
            AlignerError::Invariant(msg) => Self::AlignmentInvariant(msg),
        }
    }
}
