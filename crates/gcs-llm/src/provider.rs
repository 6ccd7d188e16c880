//! LLM provider trait.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::LlmResult;
use crate::types::{GenerateRequest, LlmResponse, StreamEvent};

/// A boxed stream of provider events.
pub type StreamBox = Pin<Box<dyn Stream<Item = LlmResult<StreamEvent>> + Send>>;

/// Provider-agnostic request/stream interface.
///
/// For providers requiring bearer auth, implementations obtain the token
/// via `gcs-auth` before each call; a missing/invalid token surfaces as
/// [`crate::error::LlmError::Auth`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, for logging and model-registry lookups.
    fn name(&self) -> &str;

    /// Non-streaming completion.
    ///
    /// # Errors
    /// Returns an [`crate::error::LlmError`]; transient network/5xx errors
    /// are retried internally with exponential backoff before surfacing.
    async fn generate(&self, request: GenerateRequest<'_>) -> LlmResult<LlmResponse>;

    /// Streaming completion; the terminal event is always `TokenCounts`
    /// unless the stream ends in `Error`.
    ///
    /// # Errors
    /// Returns an [`crate::error::LlmError`] if the stream cannot be
    /// established at all (errors that occur mid-stream are delivered as
    /// `StreamEvent::Error` items instead).
    async fn stream(&self, request: GenerateRequest<'_>) -> LlmResult<StreamBox>;

    /// Approximate local token count, used when the provider response omits
    /// usage fields.
    fn count_tokens(&self, text: &str) -> u64 {
        // ~4 chars per token, matching common BPE tokenizer averages.
        (text.len() as u64 / 4).max(u64::from(!text.is_empty()))
    }

    /// Maximum context window in tokens, for compression planning.
    fn max_context_length(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    #[async_trait]
    impl LlmProvider for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }

        async fn generate(&self, _request: GenerateRequest<'_>) -> LlmResult<LlmResponse> {
            unimplemented!()
        }

        async fn stream(&self, _request: GenerateRequest<'_>) -> LlmResult<StreamBox> {
            unimplemented!()
        }

        fn max_context_length(&self) -> usize {
            8192
        }
    }

    #[test]
    fn default_token_count_approximates_by_length() {
        let dummy = Dummy;
        assert_eq!(dummy.count_tokens(""), 0);
        assert_eq!(dummy.count_tokens("abcd"), 1);
        assert_eq!(dummy.count_tokens("abcdefgh"), 2);
    }
}
