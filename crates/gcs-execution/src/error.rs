//! Tool Execution Manager errors.

use gcs_core::ErrorKind;
use thiserror::Error;

/// Errors from validating, approving, or routing a tool call.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No tool is registered under this name.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Parameters failed JSON-Schema validation.
    #[error("invalid parameters for {tool}: {reason}")]
    ValidationFailed {
        /// Tool name.
        tool: String,
        /// Validation failure detail.
        reason: String,
    },

    /// The approval gate denied the call.
    #[error("approval denied for {0}")]
    ApprovalDenied(String),

    /// The approval gate did not resolve before its timeout.
    #[error("approval timed out for {0}")]
    ApprovalTimeout(String),

    /// An external tool's owning MCP connection is unavailable.
    #[error("no route to {0}: origin server is offline")]
    NoRoute(String),

    /// Execution exceeded its deadline.
    #[error("execution of {0} timed out")]
    ExecutionTimeout(String),

    /// The tool itself reported a failure.
    #[error("execution of {tool} failed: {reason}")]
    ExecutionFailed {
        /// Tool name.
        tool: String,
        /// Failure detail.
        reason: String,
    },
}

impl ExecutionError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ToolNotFound(_) => ErrorKind::ToolNotFound,
            Self::ValidationFailed { .. } => ErrorKind::ValidationError,
            Self::ApprovalDenied(_) => ErrorKind::ApprovalDenied,
            Self::ApprovalTimeout(_) => ErrorKind::ApprovalTimeout,
            Self::NoRoute(_) => ErrorKind::NoRoute,
            Self::ExecutionTimeout(_) => ErrorKind::ExecutionTimeout,
            Self::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
        }
    }
}

/// Result type for tool execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
