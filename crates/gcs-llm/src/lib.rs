//! Provider-agnostic LLM adapter: a uniform `generate`/`stream` interface
//! over chat-completions-style providers, with pluggable bearer-token
//! sources for OAuth- or static-key-backed providers.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod auth_source;
mod error;
mod openai_compat;
mod provider;
mod types;

pub use auth_source::{OAuthTokenSource, StaticToken, TokenSource};
pub use error::{LlmError, LlmResult};
pub use openai_compat::{OpenAiCompatProvider, ProviderConfig};
pub use provider::{LlmProvider, StreamBox};
pub use types::{
    GenerateRequest, LlmFunctionDescriptor, LlmResponse, LlmToolDefinition, StreamEvent,
};
