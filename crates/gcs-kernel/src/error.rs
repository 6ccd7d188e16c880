//! Kernel-level errors: mostly pass-through from the crates it wires.

use gcs_core::ErrorKind;
use thiserror::Error;

/// Errors raised while constructing the kernel or switching configurations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A named configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] gcs_config::ConfigError),

    /// The persisted MCP server registry could not be read.
    #[error(transparent)]
    Mcp(#[from] gcs_mcp::McpError),

    /// A credential operation failed during construction.
    #[error(transparent)]
    Auth(#[from] gcs_auth::AuthError),

    /// A configuration manifest named a tool outside the built-in catalog.
    #[error("unknown tool '{0}' named in configuration manifest")]
    UnknownTool(String),
}

impl KernelError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::UnknownTool(_) => ErrorKind::ValidationError,
            Self::Mcp(e) => e.kind(),
            Self::Auth(_) => ErrorKind::AuthError,
        }
    }
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
