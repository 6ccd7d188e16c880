//! The approval gate: resolves a tool's approval policy against the global
//! approval mode, prompting a handler when a human decision is required and
//! remembering `Auto`-tier approvals for the rest of the session.

use async_trait::async_trait;
use gcs_core::{ApprovalPolicy, ToolDefinition};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ExecutionError, ExecutionResult};

/// Default time to wait for a human approval decision.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);

/// A pending approval, presented to an [`ApprovalHandler`].
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    /// Tool being invoked.
    pub tool_name: String,
    /// Parameters for this call.
    pub parameters: Value,
    /// Why approval is being requested.
    pub reason: String,
}

/// A human's response to an [`ApprovalRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// The call may proceed.
    Approved,
    /// The call is rejected.
    Denied,
}

/// Presents approval requests to whatever frontend is attached (CLI prompt,
/// pre-authorized batch runner, etc).
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Ask for a decision on `request`. Returning `None` means the handler
    /// could not obtain a decision (e.g. no human is attached).
    async fn decide(&self, request: ApprovalRequest) -> Option<ApprovalDecision>;
}

/// An [`ApprovalHandler`] that always denies, used when the runtime has no
/// frontend attached and the default policy would otherwise hang forever.
pub struct AlwaysDeny;

#[async_trait]
impl ApprovalHandler for AlwaysDeny {
    async fn decide(&self, _request: ApprovalRequest) -> Option<ApprovalDecision> {
        Some(ApprovalDecision::Denied)
    }
}

/// The outcome of evaluating a call against the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// No human decision was needed, or one was already on record.
    AutoApproved,
    /// A human explicitly approved the call.
    Approved,
}

/// Resolves a tool's [`ApprovalPolicy`] against the global approval mode.
///
/// Ordering from most to least restrictive: `Default` < `Auto` < `Plan` <
/// `Yolo`. The effective policy for a call is whichever of the global mode
/// and the tool's own policy is more permissive — the global mode is an
/// admin-level override that can only loosen restrictions, never tighten
/// ones a tool author opted into.
pub struct ApprovalGate {
    global_mode: RwLock<ApprovalPolicy>,
    handler: RwLock<Option<std::sync::Arc<dyn ApprovalHandler>>>,
    timeout: RwLock<Duration>,
    allowed_this_session: RwLock<HashSet<String>>,
}

impl ApprovalGate {
    /// Build a gate starting in `ApprovalPolicy::Default` mode with no
    /// handler attached (every `Default`-tier call will time out until one
    /// is registered).
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_mode: RwLock::new(ApprovalPolicy::Default),
            handler: RwLock::new(None),
            timeout: RwLock::new(DEFAULT_APPROVAL_TIMEOUT),
            allowed_this_session: RwLock::new(HashSet::new()),
        }
    }

    /// Set the global approval mode.
    pub async fn set_global_mode(&self, mode: ApprovalPolicy) {
        *self.global_mode.write().await = mode;
    }

    /// Attach the handler that will field human approval requests.
    pub async fn set_handler(&self, handler: std::sync::Arc<dyn ApprovalHandler>) {
        *self.handler.write().await = Some(handler);
    }

    /// Override the approval-response timeout.
    pub async fn set_timeout(&self, timeout: Duration) {
        *self.timeout.write().await = timeout;
    }

    /// Evaluate whether `tool` may be invoked with `parameters` right now.
    ///
    /// # Errors
    /// Returns `ApprovalDenied` if a human explicitly rejected the call, or
    /// `ApprovalTimeout` if no decision arrived within the configured
    /// timeout.
    pub async fn evaluate(&self, tool: &ToolDefinition, parameters: &Value) -> ExecutionResult<ApprovalOutcome> {
        let effective = self.effective_policy(tool.approval_policy).await;

        match effective {
            ApprovalPolicy::Yolo | ApprovalPolicy::Plan => Ok(ApprovalOutcome::AutoApproved),
            ApprovalPolicy::Auto => {
                if self.allowed_this_session.read().await.contains(&tool.name) {
                    return Ok(ApprovalOutcome::AutoApproved);
                }
                let decision = self.request_decision(tool, parameters, "auto-tier tool requires first-use approval").await?;
                self.allowed_this_session.write().await.insert(tool.name.clone());
                Ok(decision)
            },
            ApprovalPolicy::Default => {
                self.request_decision(tool, parameters, "explicit approval required").await
            },
        }
    }

    async fn effective_policy(&self, tool_policy: ApprovalPolicy) -> ApprovalPolicy {
        let global = *self.global_mode.read().await;
        if rank(global) >= rank(tool_policy) {
            global
        } else {
            tool_policy
        }
    }

    async fn request_decision(
        &self,
        tool: &ToolDefinition,
        parameters: &Value,
        reason: &str,
    ) -> ExecutionResult<ApprovalOutcome> {
        let handler = self.handler.read().await.clone();
        let Some(handler) = handler else {
            return Err(ExecutionError::ApprovalTimeout(tool.name.clone()));
        };
        let request = ApprovalRequest {
            tool_name: tool.name.clone(),
            parameters: parameters.clone(),
            reason: reason.to_string(),
        };
        let timeout = *self.timeout.read().await;

        match tokio::time::timeout(timeout, handler.decide(request)).await {
            Ok(Some(ApprovalDecision::Approved)) => {
                debug!(tool = %tool.name, "approval granted");
                Ok(ApprovalOutcome::Approved)
            },
            Ok(Some(ApprovalDecision::Denied)) => Err(ExecutionError::ApprovalDenied(tool.name.clone())),
            Ok(None) | Err(_) => Err(ExecutionError::ApprovalTimeout(tool.name.clone())),
        }
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

fn rank(policy: ApprovalPolicy) -> u8 {
    match policy {
        ApprovalPolicy::Default => 0,
        ApprovalPolicy::Auto => 1,
        ApprovalPolicy::Plan => 2,
        ApprovalPolicy::Yolo => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct AlwaysApprove;

    #[async_trait]
    impl ApprovalHandler for AlwaysApprove {
        async fn decide(&self, _request: ApprovalRequest) -> Option<ApprovalDecision> {
            Some(ApprovalDecision::Approved)
        }
    }

    #[tokio::test]
    async fn yolo_mode_never_prompts() {
        let gate = ApprovalGate::new();
        gate.set_global_mode(ApprovalPolicy::Yolo).await;
        let tool = ToolDefinition::local("rm", "deletes");
        let outcome = gate.evaluate(&tool, &serde_json::json!({})).await.unwrap();
        assert_eq!(outcome, ApprovalOutcome::AutoApproved);
    }

    #[tokio::test]
    async fn default_mode_without_handler_times_out() {
        let gate = ApprovalGate::new();
        let tool = ToolDefinition::local("write", "writes");
        let err = gate.evaluate(&tool, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ApprovalTimeout(_)));
    }

    #[tokio::test]
    async fn auto_tier_remembers_approval_across_calls() {
        let gate = ApprovalGate::new();
        gate.set_handler(Arc::new(AlwaysApprove)).await;
        let mut tool = ToolDefinition::local("ping", "pings");
        tool.approval_policy = ApprovalPolicy::Auto;

        let first = gate.evaluate(&tool, &serde_json::json!({})).await.unwrap();
        assert_eq!(first, ApprovalOutcome::Approved);

        let second = gate.evaluate(&tool, &serde_json::json!({})).await.unwrap();
        assert_eq!(second, ApprovalOutcome::AutoApproved);
    }

    #[tokio::test]
    async fn denial_surfaces_as_error() {
        struct AlwaysDenyHandler;
        #[async_trait]
        impl ApprovalHandler for AlwaysDenyHandler {
            async fn decide(&self, _request: ApprovalRequest) -> Option<ApprovalDecision> {
                Some(ApprovalDecision::Denied)
            }
        }
        let gate = ApprovalGate::new();
        gate.set_handler(Arc::new(AlwaysDenyHandler)).await;
        let tool = ToolDefinition::local("danger", "danger");
        let err = gate.evaluate(&tool, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutionError::ApprovalDenied(_)));
    }
}
