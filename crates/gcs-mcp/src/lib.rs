//! The MCP Connection Manager: connects to external tool servers over
//! stdio or streamable HTTP, keeps the shared Tool Registry in sync with
//! their advertised tools, and monitors connection health in the
//! background.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod manager;
mod registry_store;
mod types;

pub use error::{McpError, McpResult};
pub use manager::{server_id_for_url, ConnectionManager, DEFAULT_CALL_DEADLINE};
pub use registry_store::{RegistryStore, RegistryStoreConfig};
pub use types::{content_hash, McpToolResult, ServerCapabilities, ServerRecord, ServerStatus, Transport};
