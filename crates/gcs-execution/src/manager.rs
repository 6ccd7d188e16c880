//! The Tool Execution Manager: validates parameters, gates the call
//! through approval, routes it to its handler, and records the outcome as a
//! [`ToolExecution`].

use gcs_core::{RuntimeHandle, ToolExecution, ToolExecutionState, ToolKind, ToolResult};
use gcs_mcp::{ConnectionManager, DEFAULT_CALL_DEADLINE};
use gcs_registry::ToolRegistry;
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::approval::ApprovalGate;
use crate::error::ExecutionError;
use crate::local::LocalToolHandler;

/// The Tool Execution Manager.
pub struct ExecutionManager {
    registry: ToolRegistry,
    mcp: Option<Arc<ConnectionManager>>,
    approval: Arc<ApprovalGate>,
    local_handlers: RwLock<HashMap<String, Arc<dyn LocalToolHandler>>>,
    runtime: RwLock<Option<Arc<dyn RuntimeHandle>>>,
    call_deadline: Duration,
}

impl ExecutionManager {
    /// Build a manager bound to the shared registry and approval gate.
    #[must_use]
    pub fn new(registry: ToolRegistry, approval: Arc<ApprovalGate>) -> Self {
        Self {
            registry,
            mcp: None,
            approval,
            local_handlers: RwLock::new(HashMap::new()),
            runtime: RwLock::new(None),
            call_deadline: DEFAULT_CALL_DEADLINE,
        }
    }

    /// Bind the MCP Connection Manager used to route `external` tools.
    #[must_use]
    pub fn with_mcp(mut self, mcp: Arc<ConnectionManager>) -> Self {
        self.mcp = Some(mcp);
        self
    }

    /// Override the per-call execution deadline.
    #[must_use]
    pub fn with_call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = deadline;
        self
    }

    /// Register a handler for a `local` or `service` tool name.
    pub async fn register_local(&self, name: impl Into<String>, handler: Arc<dyn LocalToolHandler>) {
        self.local_handlers.write().await.insert(name.into(), handler);
    }

    /// Set the capability handle passed to local tools that delegate back
    /// into the runtime (e.g. composite tools).
    pub async fn set_runtime(&self, runtime: Arc<dyn RuntimeHandle>) {
        *self.runtime.write().await = Some(runtime);
    }

    /// Run the full pipeline: lookup, validate, approve, route, execute,
    /// record.
    pub async fn execute(&self, tool_name: &str, parameters: Value) -> ToolExecution {
        let mut execution = ToolExecution::new(tool_name, parameters.clone());

        let Some(definition) = self.registry.get(tool_name).await else {
            execution.advance(ToolExecutionState::Completed);
            execution.result = Some(ToolResult::failure(tool_name, ExecutionError::ToolNotFound(tool_name.to_string()).to_string()));
            return execution;
        };

        if let Err(e) = validate_parameters(&definition.parameters, &parameters) {
            execution.advance(ToolExecutionState::Completed);
            execution.result = Some(ToolResult::failure(tool_name, e.to_string()));
            return execution;
        }

        execution.advance(ToolExecutionState::AwaitingApproval);
        execution.approval_mode = definition.approval_policy;

        match self.approval.evaluate(&definition, &parameters).await {
            Ok(_) => execution.approved = true,
            Err(e) => {
                execution.advance(ToolExecutionState::Completed);
                execution.result = Some(ToolResult::failure(tool_name, e.to_string()));
                return execution;
            },
        }

        execution.advance(ToolExecutionState::Scheduled);
        execution.advance(ToolExecutionState::Executing);

        let outcome = tokio::time::timeout(self.call_deadline, self.route(&definition, parameters)).await;

        let result = match outcome {
            Ok(Ok(content)) => ToolResult::success(tool_name, content),
            Ok(Err(e)) => ToolResult::failure(tool_name, e.to_string()),
            Err(_) => ToolResult::failure(tool_name, ExecutionError::ExecutionTimeout(tool_name.to_string()).to_string()),
        };

        execution.complete(result);
        execution
    }

    async fn route(&self, definition: &gcs_core::ToolDefinition, parameters: Value) -> Result<String, ExecutionError> {
        match definition.kind {
            ToolKind::Local | ToolKind::Service => {
                let handler = self
                    .local_handlers
                    .read()
                    .await
                    .get(&definition.name)
                    .cloned()
                    .ok_or_else(|| ExecutionError::NoRoute(definition.name.clone()))?;
                let runtime = self.runtime.read().await.clone().ok_or_else(|| {
                    ExecutionError::ExecutionFailed { tool: definition.name.clone(), reason: "no runtime handle bound".into() }
                })?;
                handler.execute(parameters, &runtime).await.map_err(|e| match e {
                    ExecutionError::ToolNotFound(_)
                    | ExecutionError::ValidationFailed { .. }
                    | ExecutionError::ApprovalDenied(_)
                    | ExecutionError::ApprovalTimeout(_)
                    | ExecutionError::NoRoute(_)
                    | ExecutionError::ExecutionTimeout(_)
                    | ExecutionError::ExecutionFailed { .. } => e,
                })
            },
            ToolKind::External => {
                let mcp = self.mcp.as_ref().ok_or_else(|| ExecutionError::NoRoute(definition.name.clone()))?;
                let server_id = definition
                    .origin
                    .as_ref()
                    .ok_or_else(|| ExecutionError::NoRoute(definition.name.clone()))?;

                let result = mcp
                    .call_tool(server_id, &definition.name, parameters, self.call_deadline)
                    .await
                    .map_err(|e| match e.kind() {
                        gcs_core::ErrorKind::ExecutionTimeout => {
                            ExecutionError::ExecutionTimeout(definition.name.clone())
                        },
                        gcs_core::ErrorKind::NoRoute => ExecutionError::NoRoute(definition.name.clone()),
                        _ => ExecutionError::ExecutionFailed { tool: definition.name.clone(), reason: e.to_string() },
                    })?;

                if result.success {
                    Ok(result.text)
                } else {
                    Err(ExecutionError::ExecutionFailed { tool: definition.name.clone(), reason: result.text })
                }
            },
        }
    }
}

fn validate_parameters(schema: &Value, parameters: &Value) -> Result<(), ExecutionError> {
    let validator = Validator::new(schema).map_err(|e| ExecutionError::ValidationFailed {
        tool: "<schema>".to_string(),
        reason: format!("tool schema itself is invalid: {e}"),
    })?;
    if let Err(e) = validator.validate(parameters) {
        warn!(error = %e, "tool parameters failed schema validation");
        return Err(ExecutionError::ValidationFailed { tool: "<schema>".to_string(), reason: e.to_string() });
    }
    debug!("parameters validated against schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcs_core::ToolDefinition;

    struct Echo;

    #[async_trait]
    impl LocalToolHandler for Echo {
        async fn execute(&self, parameters: Value, _runtime: &Arc<dyn RuntimeHandle>) -> Result<String, ExecutionError> {
            Ok(parameters.to_string())
        }
    }

    fn manager_with_yolo() -> ExecutionManager {
        let registry = ToolRegistry::new();
        let gate = Arc::new(ApprovalGate::new());
        ExecutionManager::new(registry, gate)
    }

    #[tokio::test]
    async fn unknown_tool_fails_fast() {
        let manager = manager_with_yolo();
        let execution = manager.execute("nope", serde_json::json!({})).await;
        assert_eq!(execution.state, ToolExecutionState::Completed);
        assert!(!execution.result.unwrap().success);
    }

    #[tokio::test]
    async fn local_tool_executes_under_yolo_mode() {
        let manager = manager_with_yolo();
        manager.approval.set_global_mode(gcs_core::ApprovalPolicy::Yolo).await;
        manager.registry.register(ToolDefinition::local("echo", "echoes")).await;
        manager.register_local("echo", Arc::new(Echo)).await;
        manager.set_runtime(Arc::new(gcs_core::testing::StubRuntime::new())).await;

        let execution = manager.execute("echo", serde_json::json!({"x": 1})).await;
        assert!(execution.result.unwrap().success);
    }

    #[tokio::test]
    async fn invalid_parameters_fail_validation() {
        let manager = manager_with_yolo();
        manager.approval.set_global_mode(gcs_core::ApprovalPolicy::Yolo).await;
        let tool = ToolDefinition::local("strict", "strict")
            .with_parameters(serde_json::json!({"type": "object", "required": ["x"], "properties": {"x": {"type": "string"}}}));
        manager.registry.register(tool).await;
        manager.register_local("strict", Arc::new(Echo)).await;

        let execution = manager.execute("strict", serde_json::json!({})).await;
        let result = execution.result.unwrap();
        assert!(!result.success);
    }
}
