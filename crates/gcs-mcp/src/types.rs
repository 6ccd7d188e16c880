//! Types describing MCP servers and their tool-call results.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a connection to a server is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transport {
    /// Spawn a child process and speak MCP over its stdio.
    Stdio {
        /// Executable to run.
        command: String,
        /// Arguments to pass.
        #[serde(default)]
        args: Vec<String>,
    },
    /// Connect to a streamable-HTTP (SSE) MCP endpoint.
    StreamableHttp {
        /// Endpoint URL.
        url: String,
    },
}

/// A server's last known connection status, persisted across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// Connected and passing health checks at last observation.
    Active,
    /// Explicitly disconnected by the user.
    Disconnected,
    /// Connection attempts are failing.
    Error,
}

/// A persisted record of a configured MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Deterministic id derived from the transport's identifying content.
    pub server_id: String,
    /// Human-facing name.
    pub name: String,
    /// How to reach the server.
    pub transport: Transport,
    /// Last known status, used to decide startup reconnection.
    pub status: ServerStatus,
}

impl ServerRecord {
    /// Build a record for a stdio server, deriving its id from the command
    /// line (so the same command+args always gets the same id).
    #[must_use]
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        let command = command.into();
        let transport = Transport::Stdio { command: command.clone(), args: args.clone() };
        let id_source = format!("stdio:{command}:{}", args.join(" "));
        Self {
            server_id: content_hash(&id_source),
            name: name.into(),
            transport,
            status: ServerStatus::Disconnected,
        }
    }

    /// Build a record for a streamable-HTTP server, deriving its id from the
    /// URL.
    #[must_use]
    pub fn streamable_http(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            server_id: content_hash(&url),
            name: name.into(),
            transport: Transport::StreamableHttp { url },
            status: ServerStatus::Disconnected,
        }
    }
}

/// Deterministic content-derived identifier for a server's transport.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// The result of calling a tool on an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// Text content returned by the tool.
    pub text: String,
}

impl McpToolResult {
    /// Build a success result from text content.
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self { success: true, text: text.into() }
    }

    /// Build a failure result from an error message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, text: message.into() }
    }
}

/// A server's advertised capabilities, read at connect time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Whether the server exposes tools.
    pub tools: bool,
    /// Whether the server exposes resources.
    pub resources: bool,
    /// Whether the server exposes prompts.
    pub prompts: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash("https://example.com/mcp"), content_hash("https://example.com/mcp"));
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn stdio_record_id_depends_on_command_and_args() {
        let a = ServerRecord::stdio("fs", "npx", vec!["-y".into(), "server".into()]);
        let b = ServerRecord::stdio("fs-renamed", "npx", vec!["-y".into(), "server".into()]);
        assert_eq!(a.server_id, b.server_id);
    }
}
