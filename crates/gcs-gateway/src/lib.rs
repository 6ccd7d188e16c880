//! Contextual LLM Gateway: builds the system message from the live tool
//! registry and domain context, sends turns through an `LlmProvider`, and
//! reconciles the native and textual tool-call shapes into one contract.
//! Also implements conversation summarization on behalf of `gcs-conversation`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod extraction;
mod gateway;
mod system;

pub use error::{GatewayError, GatewayResult};
pub use extraction::extract_textual_tool_call;
pub use gateway::ContextualLlmGateway;
pub use system::{compose_final_system_message, compose_system_message};
