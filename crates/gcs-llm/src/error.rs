//! LLM adapter errors.

use gcs_core::ErrorKind;
use thiserror::Error;

/// Errors from the LLM Provider Adapter.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid bearer credentials.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport-level failure (connect/read/timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider returned HTTP 429.
    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimit {
        /// Seconds to wait before retrying, if the provider specified one.
        retry_after_secs: Option<u64>,
    },

    /// Provider returned HTTP 5xx.
    #[error("provider server error: {0}")]
    ServerError(String),

    /// The provider's response could not be parsed into the expected shape.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Streaming-specific failure mid-stream.
    #[error("streaming error: {0}")]
    Streaming(String),
}

impl LlmError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::AuthError,
            Self::Network(_) => ErrorKind::NetworkError,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::ServerError(_) => ErrorKind::ServerError,
            Self::InvalidResponse(_) | Self::Streaming(_) => ErrorKind::LlmParseError,
        }
    }

    /// Whether the retry policy (exponential backoff, 3 attempts, base 1s,
    /// cap 60s) applies to this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit { .. } | Self::ServerError(_))
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
