//! Orchestration errors.

use gcs_core::ErrorKind;
use gcs_gateway::GatewayError;
use thiserror::Error;

/// Errors surfaced by a turn loop run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The turn's cancellation token fired before completion.
    #[error("turn cancelled")]
    Cancelled,

    /// The gateway call failed in a way the loop cannot recover from: a
    /// network/provider error, or an unrecoverable auth failure, surfaces
    /// immediately rather than being folded into a `tool` message.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl OrchestratorError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Gateway(e) => e.kind(),
        }
    }
}

/// Result type for orchestration operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
