use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding backend error: {0}")]
    Backend(String),

    #[error("No embedding available for token '{0}'")]
    UnknownToken(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding task failed: {0}")]
    Join(String),
}

impl EmbeddingError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Transport failures and server-side errors are worth another attempt
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|status| status.is_server_error())
            }
            _ => false,
        }
    }
}
