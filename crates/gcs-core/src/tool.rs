//! Tool Definition.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a tool, determining how the Tool Execution Manager routes a
/// call to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// An in-process built-in tool.
    Local,
    /// An internal system service method.
    Service,
    /// A tool delegated to a named MCP server.
    External,
}

/// Approval requirement for a tool, combined at call time with the global
/// approval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Use the global default: explicit approval required.
    Default,
    /// Auto-approve if idempotent/read-only.
    Auto,
    /// Auto-approve so long as the tool has no side effects.
    Plan,
    /// Auto-approve everything (global override only, never set per-tool
    /// by well-behaved registrations).
    Yolo,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::Default
    }
}

/// A catalogued, callable capability.
///
/// `name` is unique across the registry; `parameters` must be a valid
/// JSON-Schema object of type `object`; for `External` tools, `origin`
/// must reference a live MCP connection at the time the tool is
/// registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Stable identifier, unique across the registry.
    pub name: String,
    /// Human-facing display name.
    pub display_name: String,
    /// Description shown to the LLM.
    pub description: String,
    /// JSON-Schema object describing the parameters.
    pub parameters: Value,
    /// Local / service / external.
    pub kind: ToolKind,
    /// For `External` tools, the owning MCP `server_id`.
    pub origin: Option<String>,
    /// Approval policy for this tool.
    pub approval_policy: ApprovalPolicy,
}

impl ToolDefinition {
    /// Create a new local tool definition with an object-schema default.
    #[must_use]
    pub fn local(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            kind: ToolKind::Local,
            origin: None,
            approval_policy: ApprovalPolicy::Default,
        }
    }

    /// Create a new external tool definition, bound to an MCP server id.
    #[must_use]
    pub fn external(
        name: impl Into<String>,
        description: impl Into<String>,
        server_id: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            kind: ToolKind::External,
            origin: Some(server_id.into()),
            approval_policy: ApprovalPolicy::Default,
        }
    }

    /// Builder: set the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    /// Builder: set the approval policy.
    #[must_use]
    pub fn with_approval_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.approval_policy = policy;
        self
    }

    /// Validate the invariant that `parameters` is a JSON-Schema object of
    /// type `object`.
    #[must_use]
    pub fn has_valid_schema_shape(&self) -> bool {
        self.parameters
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t == "object")
    }
}
