//! The Conversation Store: a bounded, append-only message log for one
//! conversation, with size-based automatic compression via LLM
//! summarisation and a per-conversation domain-context slot.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod store;
mod summarizer;

pub use store::{
    ConversationStore, ConversationStoreConfig, DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MAX_HISTORY_LENGTH,
};
pub use summarizer::{SummarizeError, Summarizer};
