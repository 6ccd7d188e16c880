//! The Tool Execution Manager: the single place a tool call passes
//! through on its way from "the LLM asked for this" to "here is the
//! result" — lookup, schema validation, approval, routing, and recording.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod approval;
mod error;
mod local;
mod manager;

pub use approval::{
    AlwaysDeny, ApprovalDecision, ApprovalGate, ApprovalHandler, ApprovalOutcome, ApprovalRequest,
    DEFAULT_APPROVAL_TIMEOUT,
};
pub use error::{ExecutionError, ExecutionResult};
pub use local::LocalToolHandler;
pub use manager::ExecutionManager;
