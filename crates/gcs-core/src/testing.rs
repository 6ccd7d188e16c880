//! Small deterministic test doubles shared across the workspace: a
//! grab-bag of fixtures used by higher-level crates' own test modules,
//! kept intentionally tiny.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::capability::RuntimeHandle;
use crate::error::{ErrorKind, GcsError};
use crate::execution::ToolResult;
use crate::tool::ToolDefinition;

/// A `RuntimeHandle` stub backed by an in-memory map of canned results.
///
/// `call_tool` returns whatever was registered via [`StubRuntime::stub`], or
/// a `TOOL_NOT_FOUND` error if nothing was registered for that name.
#[derive(Default)]
pub struct StubRuntime {
    tools: HashMap<String, ToolDefinition>,
    responses: Mutex<HashMap<String, ToolResult>>,
    notifications: Mutex<Vec<String>>,
}

impl StubRuntime {
    /// Create an empty stub runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool definition.
    #[must_use]
    pub fn with_tool(mut self, def: ToolDefinition) -> Self {
        self.tools.insert(def.name.clone(), def);
        self
    }

    /// Register a canned result for a tool name.
    #[must_use]
    pub fn with_response(self, name: impl Into<String>, result: ToolResult) -> Self {
        self.responses
            .lock()
            .expect("stub runtime mutex poisoned")
            .insert(name.into(), result);
        self
    }

    /// All notifications observed so far, in order.
    #[must_use]
    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .expect("stub runtime mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl RuntimeHandle for StubRuntime {
    async fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).cloned()
    }

    async fn call_tool(&self, name: &str, _parameters: Value) -> Result<ToolResult, GcsError> {
        self.responses
            .lock()
            .expect("stub runtime mutex poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| GcsError::new(ErrorKind::ToolNotFound, name.to_string()))
    }

    async fn list_configurations(&self) -> Vec<String> {
        Vec::new()
    }

    fn notify(&self, event: &str) {
        self.notifications
            .lock()
            .expect("stub runtime mutex poisoned")
            .push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_returns_registered_response() {
        let stub = StubRuntime::new()
            .with_tool(ToolDefinition::local("ping", "pings"))
            .with_response("ping", ToolResult::success("ping", "pong"));

        assert!(stub.get_tool("ping").await.is_some());
        let result = stub.call_tool("ping", serde_json::json!({})).await.unwrap();
        assert_eq!(result.llm_content, "pong");
    }

    #[tokio::test]
    async fn stub_missing_tool_is_not_found() {
        let stub = StubRuntime::new();
        let err = stub.call_tool("missing", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotFound);
    }

    #[test]
    fn notify_records_events_in_order() {
        let stub = StubRuntime::new();
        stub.notify("a");
        stub.notify("b");
        assert_eq!(stub.notifications(), vec!["a", "b"]);
    }
}
