use thiserror::Error;

/// Result type for aligner operations
pub type Result<T> = std::result::Result<T, AlignerError>;

/// Errors raised by the aligner and the stitcher
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignerError {
    /// Malformed parameters, rejected before any work starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal consistency check failed; the result must not be used
    #[error("Alignment invariant violated: {0}")]
    Invariant(String),
}

impl AlignerError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}
