//! Tool Execution and Tool Result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::tool::ApprovalPolicy;

/// Monotonic lifecycle state of a Tool Execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolExecutionState {
    /// Parameters are being validated against the schema.
    Validating,
    /// Waiting on the approval gate.
    AwaitingApproval,
    /// Approved and queued for execution.
    Scheduled,
    /// Routed to the local handler or MCP client; in flight.
    Executing,
    /// Execution finished (success or failure).
    Completed,
}

impl ToolExecutionState {
    /// Whether `next` is a legal forward transition from `self`.
    ///
    /// States progress monotonically; this never allows moving backwards.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use ToolExecutionState::{AwaitingApproval, Completed, Executing, Scheduled, Validating};
        matches!(
            (self, next),
            (Validating, AwaitingApproval)
                | (Validating, Scheduled)
                | (AwaitingApproval, Scheduled)
                | (AwaitingApproval, Completed)
                | (Scheduled, Executing)
                | (Executing, Completed)
                | (Validating, Completed)
        )
    }
}

/// A single tool invocation tracked for the duration of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    /// Unique execution id.
    pub id: Uuid,
    /// Tool being invoked.
    pub tool_name: String,
    /// Parameters passed to the tool.
    pub parameters: Value,
    /// Current lifecycle state.
    pub state: ToolExecutionState,
    /// Resolved approval policy for this call.
    pub approval_mode: ApprovalPolicy,
    /// Whether approval was granted.
    pub approved: bool,
    /// When the execution was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When execution actually began, if it got that far.
    pub executed_at: Option<DateTime<Utc>>,
    /// When execution finished, if it did.
    pub completed_at: Option<DateTime<Utc>>,
    /// Final result, once completed.
    pub result: Option<ToolResult>,
}

impl ToolExecution {
    /// Start a new execution in the `Validating` state.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool_name: tool_name.into(),
            parameters,
            state: ToolExecutionState::Validating,
            approval_mode: ApprovalPolicy::Default,
            approved: false,
            submitted_at: Utc::now(),
            executed_at: None,
            completed_at: None,
            result: None,
        }
    }

    /// Advance to a new state, enforcing monotonic progression.
    ///
    /// # Panics
    /// Panics if `next` would move the execution backwards; this is an
    /// invariant violation, not a recoverable runtime condition.
    pub fn advance(&mut self, next: ToolExecutionState) {
        assert!(
            self.state.can_advance_to(next),
            "illegal tool execution transition: {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Mark completed with a result.
    pub fn complete(&mut self, result: ToolResult) {
        self.advance(ToolExecutionState::Completed);
        self.completed_at = Some(Utc::now());
        self.result = Some(result);
    }
}

/// The outcome of executing a tool.
///
/// Exactly one of `success = true` (with `llm_content`) or `success =
/// false` (with `error`) holds once the execution has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that produced this result.
    pub tool_name: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Content fed back to the LLM as a `tool` message.
    pub llm_content: String,
    /// Content shown to the user (may differ from `llm_content`, e.g. more
    /// verbose or formatted).
    pub display_content: String,
    /// Error detail, present only when `success = false`.
    pub error: Option<String>,
}

impl ToolResult {
    /// Build a success result where LLM and display content are identical.
    #[must_use]
    pub fn success(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            tool_name: tool_name.into(),
            success: true,
            llm_content: content.clone(),
            display_content: content,
            error: None,
        }
    }

    /// Build a failure result.
    #[must_use]
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            tool_name: tool_name.into(),
            success: false,
            llm_content: format!("Error: {error}"),
            display_content: error.clone(),
            error: Some(error),
        }
    }

    /// Validate the invariant: success XOR error-present.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.success == self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_transitions_only() {
        let mut e = ToolExecution::new("t", serde_json::json!({}));
        e.advance(ToolExecutionState::Scheduled);
        e.advance(ToolExecutionState::Executing);
        e.complete(ToolResult::success("t", "ok"));
        assert_eq!(e.state, ToolExecutionState::Completed);
    }

    #[test]
    #[should_panic(expected = "illegal tool execution transition")]
    fn backwards_transition_panics() {
        let mut e = ToolExecution::new("t", serde_json::json!({}));
        e.advance(ToolExecutionState::Scheduled);
        e.advance(ToolExecutionState::Validating);
    }

    #[test]
    fn result_invariant_holds_for_constructors() {
        assert!(ToolResult::success("t", "ok").is_well_formed());
        assert!(ToolResult::failure("t", "bad").is_well_formed());
    }
}
