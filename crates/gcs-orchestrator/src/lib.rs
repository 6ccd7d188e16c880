//! The orchestration turn loop: the bounded, iterative LLM-tool dialogue
//! that turns one user input into a final plain-language answer, executing
//! at most a handful of tool calls along the way and streaming progress as
//! [`gcs_events::TurnEvent`]s.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod dedup;
mod error;
mod loop_;
mod shortcut;
mod suggested_agents;

pub use error::{OrchestratorError, OrchestratorResult};
pub use loop_::{Orchestrator, TurnLoopConfig, TurnOutcome, DEFAULT_MAX_TOOL_CALLS};
pub use suggested_agents::extract_suggested_agents;
