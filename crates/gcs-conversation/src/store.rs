//! The Conversation Store: an append-only message log with size-based
//! automatic compression.

use gcs_core::{Conversation, Message};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::summarizer::Summarizer;

/// Default character budget before compression kicks in.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 8000;

/// Default message-count budget before compression kicks in.
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 20;

/// Compression thresholds for a [`ConversationStore`].
#[derive(Debug, Clone, Copy)]
pub struct ConversationStoreConfig {
    /// Total content-character budget across all stored messages.
    pub max_context_chars: usize,
    /// Message-count budget across all stored messages.
    pub max_history_length: usize,
}

impl Default for ConversationStoreConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
        }
    }
}

/// Append-only conversation history with automatic, failure-tolerant
/// compression, and a per-conversation slot for domain context prepended to
/// the system prompt.
pub struct ConversationStore {
    conversation: RwLock<Conversation>,
    domain_context: RwLock<Option<String>>,
    config: ConversationStoreConfig,
}

impl ConversationStore {
    /// Build a store with the default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ConversationStoreConfig::default())
    }

    /// Build a store with explicit thresholds.
    #[must_use]
    pub fn with_config(config: ConversationStoreConfig) -> Self {
        Self {
            conversation: RwLock::new(Conversation::new()),
            domain_context: RwLock::new(None),
            config,
        }
    }

    /// Append a message. Never removes or rewrites prior entries.
    pub async fn append(&self, message: Message) {
        self.conversation.write().await.append(message);
    }

    /// An owned snapshot of the conversation's messages so far.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.conversation.read().await.messages().clone()
    }

    /// Number of messages currently stored.
    pub async fn len(&self) -> usize {
        self.conversation.read().await.len()
    }

    /// Whether the conversation is empty.
    pub async fn is_empty(&self) -> bool {
        self.conversation.read().await.is_empty()
    }

    /// Clear the conversation back to empty. Domain context is left
    /// untouched; callers that want a fresh context call
    /// [`Self::set_domain_context`] separately.
    pub async fn reset(&self) {
        *self.conversation.write().await = Conversation::new();
    }

    /// Set the domain context prepended to this conversation's system
    /// prompt. Replacing the default domain context for future
    /// conversations never mutates an already-open one.
    pub async fn set_domain_context(&self, context: Option<String>) {
        *self.domain_context.write().await = context;
    }

    /// The domain context currently attached to this conversation, if any.
    pub async fn domain_context(&self) -> Option<String> {
        self.domain_context.read().await.clone()
    }

    /// Compress the history if it has grown past either configured
    /// threshold, replacing every message but the last two with a single
    /// `system` summary message. Compression failure is non-fatal: the
    /// original history is retained and a warning is logged.
    pub async fn compress_if_needed(&self, summarizer: &dyn Summarizer) {
        let (needs_compression, to_summarize, tail) = {
            let conversation = self.conversation.read().await;
            let len = conversation.len();
            if len < 2 {
                (false, Vec::new(), Vec::new())
            } else {
                let over_chars = conversation.total_content_chars() > self.config.max_context_chars;
                let over_count = len > self.config.max_history_length;
                if !over_chars && !over_count {
                    (false, Vec::new(), Vec::new())
                } else {
                    let messages = conversation.messages();
                    let split = messages.len() - 2;
                    (true, messages[..split].to_vec(), messages[split..].to_vec())
                }
            }
        };

        if !needs_compression {
            return;
        }

        match summarizer.summarize(&to_summarize).await {
            Ok(summary_text) => {
                let summary = Message::system(format!("Previous conversation summary: {summary_text}"));
                let mut compressed = Vec::with_capacity(tail.len() + 1);
                compressed.push(summary);
                compressed.extend(tail);
                *self.conversation.write().await = Conversation::from_messages(compressed);
                debug!("conversation compressed");
            },
            Err(e) => {
                warn!(error = %e, "conversation compression failed, retaining original history");
            },
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::summarizer::SummarizeError;

    struct StubSummarizer {
        result: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _messages: &[Message]) -> Result<String, SummarizeError> {
            self.result.map(str::to_string).map_err(|e| SummarizeError(e.to_string()))
        }
    }

    fn small_config() -> ConversationStoreConfig {
        ConversationStoreConfig { max_context_chars: 20, max_history_length: 100 }
    }

    #[tokio::test]
    async fn append_never_shrinks() {
        let store = ConversationStore::new();
        store.append(Message::user("hi")).await;
        store.append(Message::assistant_text("hello")).await;
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn no_compression_below_threshold() {
        let store = ConversationStore::new();
        store.append(Message::user("hi")).await;
        store.append(Message::assistant_text("hello")).await;
        let summarizer = StubSummarizer { result: Ok("should not be used") };
        store.compress_if_needed(&summarizer).await;
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn compresses_to_summary_plus_last_two() {
        let store = ConversationStore::with_config(small_config());
        store.append(Message::user("this is a long opening message")).await;
        store.append(Message::assistant_text("an equally long reply follows here")).await;
        store.append(Message::user("second to last")).await;
        store.append(Message::assistant_text("last")).await;

        let summarizer = StubSummarizer { result: Ok("the user discussed several things") };
        store.compress_if_needed(&summarizer).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(
            snapshot[0].content.as_deref(),
            Some("Previous conversation summary: the user discussed several things")
        );
        assert_eq!(snapshot[1].content.as_deref(), Some("second to last"));
        assert_eq!(snapshot[2].content.as_deref(), Some("last"));
    }

    #[tokio::test]
    async fn compression_failure_retains_original_history() {
        let store = ConversationStore::with_config(small_config());
        store.append(Message::user("this is a long opening message")).await;
        store.append(Message::assistant_text("an equally long reply follows here")).await;
        store.append(Message::user("second to last")).await;
        store.append(Message::assistant_text("last")).await;

        let summarizer = StubSummarizer { result: Err("provider unreachable") };
        store.compress_if_needed(&summarizer).await;

        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn domain_context_round_trips() {
        let store = ConversationStore::new();
        assert!(store.domain_context().await.is_none());
        store.set_domain_context(Some("support tickets agent".to_string())).await;
        assert_eq!(store.domain_context().await.as_deref(), Some("support tickets agent"));
    }
}
