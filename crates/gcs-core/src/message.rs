//! Message and Conversation types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions / summaries.
    System,
    /// User input.
    User,
    /// Assistant output (text or tool calls).
    Assistant,
    /// A tool's result fed back to the LLM.
    Tool,
}

/// A single intent to call a tool, as emitted by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallIntent {
    /// Provider-assigned call id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool arguments, already parsed to JSON.
    pub arguments: Value,
}

/// A message in a Conversation.
///
/// Every `Tool`-role message carries a `tool_call_id` matching a prior
/// `Assistant` message's tool call id; `Assistant` messages with non-empty
/// `tool_calls` may have `content = None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role.
    pub role: MessageRole,
    /// Text content, if any.
    pub content: Option<String>,
    /// Tool calls, for `Assistant` messages that invoke tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallIntent>,
    /// The tool-call id this message answers, for `Tool`-role messages.
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Build a `system` message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Build a `user` message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Build a plain-text `assistant` message.
    #[must_use]
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Build an `assistant` message carrying tool calls (content may be
    /// absent).
    #[must_use]
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCallIntent>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Build a `tool` message answering a specific call id.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Length of this message's content, used for compression thresholds.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.as_deref().map_or(0, str::len)
    }
}

/// An ordered, append-only sequence of messages.
///
/// No message is ever silently deleted once appended; compression replaces
/// a prefix with a single `system` summary message and preserves the last
/// two entries verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Never removes or rewrites prior entries.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// An immutable snapshot of the conversation so far.
    #[must_use]
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Total character length of all message contents, used by compression
    /// thresholds.
    #[must_use]
    pub fn total_content_chars(&self) -> usize {
        self.messages.iter().map(Message::content_len).sum()
    }

    /// Number of messages currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the entire message vector (used only by the conversation
    /// store's compression routine, which must preserve append-only
    /// semantics from the caller's point of view).
    pub(crate) fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Access the full message vector (for compression in `gcs-conversation`,
    /// which lives in a different crate and needs owned access via clone).
    #[must_use]
    pub fn messages(&self) -> &Vec<Message> {
        &self.messages
    }

    /// Construct a conversation directly from a message vector (used to
    /// rebuild a compressed history).
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}
