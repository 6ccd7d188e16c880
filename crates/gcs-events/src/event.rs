//! The `TurnEvent` taxonomy.

use gcs_core::{ErrorKind, TokenCounts};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single streamed event produced during one user turn.
///
/// Consumers (a web frontend, a REPL) iterate an
/// [`EventReceiver`](crate::EventReceiver) and drop it when done; the
/// orchestration loop never blocks on a slow consumer beyond the bus's
/// bounded capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A tool is about to be invoked.
    ToolCall {
        /// Provider-assigned call id.
        call_id: String,
        /// Tool name.
        name: String,
        /// Parameters passed to the tool.
        params: Value,
    },
    /// A tool invocation has completed (success or failure).
    ToolResponse {
        /// Provider-assigned call id.
        call_id: String,
        /// Tool name.
        name: String,
        /// Whether the call succeeded.
        success: bool,
        /// The result content shown to the user.
        result: Value,
    },
    /// The final natural-language answer for this turn.
    AssistantResponse {
        /// The answer text.
        text: String,
        /// Best-effort "Suggested Agents" extraction; advisory only, never
        /// required for a valid response.
        suggested_agents: Option<Vec<String>>,
    },
    /// Accumulated token accounting for the turn.
    TokenCounts {
        /// The turn's accumulated counts.
        counts: TokenCounts,
    },
    /// Terminal event: the full conversation snapshot as of turn end.
    FinalResponse {
        /// Serialised conversation snapshot.
        conversation: Vec<gcs_core::Message>,
    },
    /// The turn was cancelled or hit a fatal error before completion.
    Error {
        /// Stable error classification.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
}

impl TurnEvent {
    /// A short, stable name for this event's variant, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResponse { .. } => "tool_response",
            Self::AssistantResponse { .. } => "assistant_response",
            Self::TokenCounts { .. } => "token_counts",
            Self::FinalResponse { .. } => "final_response",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_stable() {
        let e = TurnEvent::TokenCounts {
            counts: TokenCounts::new(1, 1),
        };
        assert_eq!(e.name(), "token_counts");
    }
}
