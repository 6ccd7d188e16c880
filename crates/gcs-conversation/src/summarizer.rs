//! The capability the conversation store calls into to compress history.

use async_trait::async_trait;
use gcs_core::Message;
use std::fmt;

/// A summarization failure. Kept deliberately narrow: the store only needs
/// to know it failed and why, for logging.
#[derive(Debug, Clone)]
pub struct SummarizeError(pub String);

impl fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "summarization failed: {}", self.0)
    }
}

impl std::error::Error for SummarizeError {}

/// Implemented by whatever can turn a run of messages into a short prose
/// summary, typically a gateway backed by an LLM provider.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `messages` into a single paragraph of prose.
    async fn summarize(&self, messages: &[Message]) -> Result<String, SummarizeError>;
}
