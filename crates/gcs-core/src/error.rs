//! Stable error-kind taxonomy.
//!
//! Every crate in the workspace defines its own `thiserror` enum for its own
//! concerns, but exposes a `kind() -> ErrorKind` so callers further up the
//! stack (the orchestration loop, in particular) can react uniformly without
//! matching on crate-specific variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error classification shared across the whole runtime.
///
/// Variant names are screaming-snake-case wire codes so log output, test
/// assertions, and wire-level error responses all agree on vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Tool parameters failed JSON-Schema validation.
    ValidationError,
    /// The tool name is not present in the registry.
    ToolNotFound,
    /// An external tool's owning MCP connection is offline.
    NoRoute,
    /// Tool execution exceeded its deadline.
    ExecutionTimeout,
    /// Tool execution returned an error or raised an exception.
    ExecutionFailed,
    /// An approval request was explicitly denied.
    ApprovalDenied,
    /// An approval request was not resolved before its timeout.
    ApprovalTimeout,
    /// Missing or invalid credentials.
    AuthError,
    /// Transport-level connect/read/timeout failure.
    NetworkError,
    /// Provider returned HTTP 429.
    RateLimit,
    /// Provider returned HTTP 5xx.
    ServerError,
    /// LLM output was neither a valid tool call nor recognisable plain text.
    LlmParseError,
    /// The turn was cancelled via its cancellation token.
    Cancelled,
    /// A credential file lock could not be acquired in time.
    LockTimeout,
}

impl ErrorKind {
    /// Whether this error kind is recognised as part of the deterministic
    /// "all tool calls failed" shortcut the turn loop applies when every
    /// call in a round fails with a recognized, non-transient kind.
    #[must_use]
    pub fn is_deterministic_shortcut_eligible(self) -> bool {
        matches!(self, Self::NetworkError | Self::ExecutionFailed)
    }

    /// Whether this error kind is fatal and should abort the turn outright
    /// rather than being folded into a `tool` message.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Cancelled | Self::AuthError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::NoRoute => "NO_ROUTE",
            Self::ExecutionTimeout => "EXECUTION_TIMEOUT",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::ApprovalDenied => "APPROVAL_DENIED",
            Self::ApprovalTimeout => "APPROVAL_TIMEOUT",
            Self::AuthError => "AUTH_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::ServerError => "SERVER_ERROR",
            Self::LlmParseError => "LLM_PARSE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::LockTimeout => "LOCK_TIMEOUT",
        };
        f.write_str(s)
    }
}

/// A generic, kind-tagged runtime error.
///
/// Used at crate boundaries where a specific `thiserror` enum would be
/// overkill (tests, glue code); subsystem crates prefer their own error
/// types but all implement `From<T> for GcsError`-style conversions where
/// they cross a boundary.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GcsError {
    /// Stable kind classification.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl GcsError {
    /// Construct a new tagged error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The stable kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}
