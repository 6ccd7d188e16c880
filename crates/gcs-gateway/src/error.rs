//! Gateway errors.

use gcs_core::ErrorKind;
use gcs_llm::LlmError;
use thiserror::Error;

/// Errors composing a request or interpreting a provider's response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The underlying provider call failed.
    #[error(transparent)]
    Provider(#[from] LlmError),

    /// Neither native tool calls nor the textual fallback shape were
    /// present in a response the caller expected to carry one.
    #[error("could not extract a tool call from the response")]
    NoToolCall,
}

impl GatewayError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider(e) => e.kind(),
            Self::NoToolCall => ErrorKind::LlmParseError,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
