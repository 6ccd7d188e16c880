//! MCP connection-manager errors.

use gcs_core::ErrorKind;
use thiserror::Error;

/// Errors from the MCP Connection Manager.
#[derive(Debug, Error)]
pub enum McpError {
    /// No server is registered under this id.
    #[error("no server registered with id {0}")]
    UnknownServer(String),

    /// The server record exists but has no live connection.
    #[error("server {0} is not connected")]
    NotConnected(String),

    /// Spawning the stdio transport's child process failed.
    #[error("failed to spawn server {server}: {reason}")]
    SpawnFailed {
        /// Server id.
        server: String,
        /// Underlying failure detail.
        reason: String,
    },

    /// The MCP handshake or a protocol call failed.
    #[error("MCP protocol error for server {server}: {reason}")]
    Protocol {
        /// Server id.
        server: String,
        /// Underlying failure detail.
        reason: String,
    },

    /// A tool call exceeded its deadline.
    #[error("tool call to {server}:{tool} timed out")]
    Timeout {
        /// Server id.
        server: String,
        /// Tool name.
        tool: String,
    },

    /// The persistent server-record store could not be read or written.
    #[error("server registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persistent server-record store contained invalid JSON.
    #[error("server registry is corrupt: {0}")]
    Corrupt(String),
}

impl McpError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownServer(_) | Self::NotConnected(_) => ErrorKind::NoRoute,
            Self::SpawnFailed { .. } | Self::Protocol { .. } => ErrorKind::ExecutionFailed,
            Self::Timeout { .. } => ErrorKind::ExecutionTimeout,
            Self::Io(_) | Self::Corrupt(_) => ErrorKind::ExecutionFailed,
        }
    }
}

/// Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;
