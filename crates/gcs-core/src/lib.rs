#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Shared types for the GCS runtime.
//!
//! Tool definitions, messages, conversations, tool executions, token
//! counts, and the stable error-kind taxonomy that every subsystem error
//! folds into. It has no business logic of its own.

pub mod capability;
pub mod error;
pub mod execution;
pub mod message;
pub mod testing;
pub mod tool;
pub mod tokens;

pub use capability::RuntimeHandle;
pub use error::{ErrorKind, GcsError};
pub use execution::{ToolExecution, ToolExecutionState, ToolResult};
pub use message::{Conversation, Message, MessageRole, ToolCallIntent};
pub use tokens::TokenCounts;
pub use tool::{ApprovalPolicy, ToolDefinition, ToolKind};
