//! The capability interface passed to tool constructors.
//!
//! A narrow, explicit handle rather than a back-pointer to the whole
//! runtime. Tools depend on `RuntimeHandle`, never on the kernel directly,
//! which keeps tools independently testable against a stub implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GcsError;
use crate::execution::ToolResult;
use crate::tool::ToolDefinition;

/// Narrow capability surface offered to tools and services.
///
/// Implemented by `gcs-kernel::Kernel`; test code implements it directly
/// against stubs (see [`crate::testing`]).
#[async_trait]
pub trait RuntimeHandle: Send + Sync {
    /// Look up a tool's definition by name.
    async fn get_tool(&self, name: &str) -> Option<ToolDefinition>;

    /// Invoke another tool through the full execution pipeline (validation,
    /// approval, routing). Used by composite tools that delegate.
    async fn call_tool(&self, name: &str, parameters: Value) -> Result<ToolResult, GcsError>;

    /// List the names of available named configurations.
    async fn list_configurations(&self) -> Vec<String>;

    /// Broadcast a free-form notification (e.g. `configuration_changed`) to
    /// subscribed observers.
    fn notify(&self, event: &str);
}
