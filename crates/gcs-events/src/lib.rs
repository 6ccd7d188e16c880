#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Streaming event taxonomy for the GCS orchestration turn loop.
//!
//! The turn loop emits events in causal order: `tool_call* ->
//! tool_response* -> assistant_response -> token_counts ->
//! final_response`. This crate provides the typed event enum and a
//! broadcast-based bus: a `tokio::sync::broadcast` channel wrapped so
//! lagging receivers are reported rather than silently dropped.

mod bus;
mod event;

pub use bus::{EventBus, EventReceiver, DEFAULT_CHANNEL_CAPACITY};
pub use event::TurnEvent;
