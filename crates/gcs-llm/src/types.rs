//! Request/response types for the LLM Provider Adapter.

use gcs_core::{Message, TokenCounts, ToolCallIntent, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as presented to an LLM provider: `{type: "function", function:
/// {name, description, parameters}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmToolDefinition {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// The function descriptor.
    pub function: LlmFunctionDescriptor,
}

/// The `function` object inside an [`LlmToolDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmFunctionDescriptor {
    /// Tool name.
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON-Schema parameters object.
    pub parameters: Value,
}

impl From<&ToolDefinition> for LlmToolDefinition {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: LlmFunctionDescriptor {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

/// A non-streaming completion result.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Plain-text content, if the model produced a direct answer.
    pub content: Option<String>,
    /// Tool calls, if the model chose to invoke tools instead of (or in
    /// addition to, for providers that allow it) answering directly.
    pub tool_calls: Vec<ToolCallIntent>,
    /// Token accounting for this single call.
    pub token_counts: TokenCounts,
}

impl LlmResponse {
    /// Whether this response carries at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A streamed event from a provider.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A partial text chunk.
    Chunk {
        /// Delta text.
        content: String,
    },
    /// Partial tool-call arguments, identified by provider call id.
    ToolCallDelta {
        /// Provider-assigned call id.
        id: String,
        /// Partial JSON fragment for the arguments.
        arguments_delta: String,
    },
    /// Terminal event carrying final token accounting.
    TokenCounts {
        /// Final counts for the call.
        counts: TokenCounts,
    },
    /// A transport or provider error occurred mid-stream.
    Error {
        /// Human-readable detail.
        message: String,
    },
}

/// Request parameters shared by `generate` and `stream`.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    /// Conversation history to send.
    pub messages: &'a [Message],
    /// Tool catalogue to offer, if any.
    pub tools: Option<&'a [LlmToolDefinition]>,
    /// Model override.
    pub model: Option<&'a str>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Whether to request token accounting in the response.
    pub return_token_counts: bool,
}
