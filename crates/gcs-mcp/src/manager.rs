//! The MCP Connection Manager: owns live connections to external MCP
//! servers, keeps the shared Tool Registry in sync with them, and runs a
//! background health-check loop that drops servers which stop responding.

use gcs_registry::ToolRegistry;
use rmcp::model::{CallToolRequestParams, RawContent, Tool as RmcpTool};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransport;
use rmcp::transport::TokioChildProcess;
use rmcp::{RoleClient, ServiceExt};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{McpError, McpResult};
use crate::registry_store::RegistryStore;
use crate::types::{content_hash, McpToolResult, ServerCapabilities, ServerRecord, ServerStatus, Transport};

/// Default deadline for a single tool call.
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(30);

/// Consecutive health-check failures before a server is dropped.
const HEALTH_FAILURE_THRESHOLD: u32 = 5;

/// Interval between health checks.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

struct LiveConnection {
    record: ServerRecord,
    service: RunningService<RoleClient, ()>,
    capabilities: ServerCapabilities,
    consecutive_failures: u32,
}

/// Owns every live MCP connection and keeps the Tool Registry in sync.
pub struct ConnectionManager {
    registry: ToolRegistry,
    store: Arc<RegistryStore>,
    live: Arc<RwLock<HashMap<String, LiveConnection>>>,
    health_task: RwLock<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    /// Build a manager bound to the shared Tool Registry and a persisted
    /// server-record store.
    #[must_use]
    pub fn new(registry: ToolRegistry, store: RegistryStore) -> Self {
        Self {
            registry,
            store: Arc::new(store),
            live: Arc::new(RwLock::new(HashMap::new())),
            health_task: RwLock::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Reconnect every server whose last known status was `active`, logging
    /// and continuing past individual failures so one dead server never
    /// blocks startup.
    pub async fn reconnect_previously_active(&self) {
        for record in self.store.previously_active().await {
            let name = record.name.clone();
            if let Err(e) = self.connect_record(record).await {
                warn!(server = %name, error = %e, "failed to reconnect server at startup");
            }
        }
    }

    /// Connect a stdio server, registering its tools before returning.
    ///
    /// # Errors
    /// Returns an error if the child process cannot be spawned or the MCP
    /// handshake fails.
    pub async fn connect_stdio(
        &self,
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> McpResult<String> {
        let name = name.into();
        let command = command.into();
        let record = ServerRecord::stdio(name, command, args);
        self.connect_record(record).await
    }

    /// Connect a streamable-HTTP (SSE) server, registering its tools before
    /// returning.
    ///
    /// # Errors
    /// Returns an error if the connection or MCP handshake fails.
    pub async fn connect_streamable_http(&self, name: impl Into<String>, url: impl Into<String>) -> McpResult<String> {
        let record = ServerRecord::streamable_http(name.into(), url.into());
        self.connect_record(record).await
    }

    async fn connect_record(&self, mut record: ServerRecord) -> McpResult<String> {
        let server_id = record.server_id.clone();

        let service = match &record.transport {
            Transport::Stdio { command, args } => {
                let transport = TokioChildProcess::new(Command::new(command).args(args)).map_err(|e| {
                    McpError::SpawnFailed { server: record.name.clone(), reason: e.to_string() }
                })?;
                ().serve(transport)
                    .await
                    .map_err(|e| McpError::Protocol { server: record.name.clone(), reason: e.to_string() })?
            },
            Transport::StreamableHttp { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                ().serve(transport)
                    .await
                    .map_err(|e| McpError::Protocol { server: record.name.clone(), reason: e.to_string() })?
            },
        };

        let tools = service
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol { server: record.name.clone(), reason: e.to_string() })?
            .tools;

        for tool in &tools {
            self.registry.register(to_tool_definition(tool, &server_id)).await;
        }

        let capabilities = ServerCapabilities { tools: !tools.is_empty(), resources: false, prompts: false };

        record.status = ServerStatus::Active;
        self.store.upsert(record.clone()).await?;

        let mut live = self.live.write().await;
        live.insert(
            server_id.clone(),
            LiveConnection { record, service, capabilities, consecutive_failures: 0 },
        );
        drop(live);

        info!(server_id = %server_id, tool_count = tools.len(), "MCP server connected");
        Ok(server_id)
    }

    /// Disconnect a server: detach its tools from the registry, then close
    /// the connection. Completes only after the registry has removed every
    /// tool the server owned.
    ///
    /// # Errors
    /// Returns `UnknownServer` if no connection is live under this id.
    pub async fn disconnect(&self, server_id: &str) -> McpResult<()> {
        self.registry.unregister_by_origin(server_id).await;

        let mut live = self.live.write().await;
        let Some(mut conn) = live.remove(server_id) else {
            return Err(McpError::UnknownServer(server_id.to_string()));
        };
        drop(live);

        conn.record.status = ServerStatus::Disconnected;
        self.store.upsert(conn.record.clone()).await?;
        let _ = conn.service.cancel().await;

        info!(server_id, "MCP server disconnected");
        Ok(())
    }

    /// Call a tool on a connected server, bounded by `deadline`.
    ///
    /// # Errors
    /// Returns `NotConnected` if the server is offline, `Timeout` if the
    /// deadline elapses, or `Protocol` on an MCP-level failure.
    pub async fn call_tool(
        &self,
        server_id: &str,
        tool_name: &str,
        arguments: serde_json::Value,
        deadline: Duration,
    ) -> McpResult<McpToolResult> {
        let live = self.live.read().await;
        let conn = live.get(server_id).ok_or_else(|| McpError::NotConnected(server_id.to_string()))?;

        let args = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            },
        };

        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(tool_name.to_string()),
            arguments: args,
            task: None,
        };

        let call = conn.service.call_tool(params);
        drop(live);

        match tokio::time::timeout(deadline, call).await {
            Ok(Ok(result)) => {
                let is_error = result.is_error.unwrap_or(false);
                let text = result
                    .content
                    .iter()
                    .filter_map(|c| match &**c {
                        RawContent::Text(t) => Some(t.text.clone()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(if is_error { McpToolResult::failed(text) } else { McpToolResult::ok(text) })
            },
            Ok(Err(e)) => Err(McpError::Protocol { server: server_id.to_string(), reason: e.to_string() }),
            Err(_) => Err(McpError::Timeout { server: server_id.to_string(), tool: tool_name.to_string() }),
        }
    }

    /// Ids of every currently-connected server.
    pub async fn list_connected(&self) -> Vec<String> {
        self.live.read().await.keys().cloned().collect()
    }

    /// Capabilities advertised by a connected server.
    pub async fn capabilities(&self, server_id: &str) -> Option<ServerCapabilities> {
        self.live.read().await.get(server_id).map(|c| c.capabilities.clone())
    }

    /// Start the background health-check loop. Calling this more than once
    /// replaces the previous loop.
    pub async fn start_health_check_loop(self: &Arc<Self>) {
        let mut task_slot = self.health_task.write().await;
        if let Some(handle) = task_slot.take() {
            handle.abort();
        }
        let manager = Arc::clone(self);
        let cancel = self.cancel.clone();
        *task_slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => manager.run_health_check().await,
                }
            }
        }));
    }

    async fn run_health_check(&self) {
        let ids: Vec<String> = self.live.read().await.keys().cloned().collect();
        for server_id in ids {
            let ok = {
                let live = self.live.read().await;
                let Some(conn) = live.get(&server_id) else { continue };
                conn.service.list_tools(Default::default()).await.is_ok()
            };

            let mut live = self.live.write().await;
            let Some(conn) = live.get_mut(&server_id) else { continue };
            if ok {
                conn.consecutive_failures = 0;
                continue;
            }
            conn.consecutive_failures += 1;
            debug!(server_id = %server_id, failures = conn.consecutive_failures, "health check failed");
            if conn.consecutive_failures >= HEALTH_FAILURE_THRESHOLD {
                warn!(server_id = %server_id, "server failed health checks, removing");
                live.remove(&server_id);
                drop(live);
                self.registry.unregister_by_origin(&server_id).await;
            }
        }
    }

    /// Disconnect every live server and stop the health-check loop.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.health_task.write().await.take() {
            handle.abort();
        }
        let ids: Vec<String> = self.live.read().await.keys().cloned().collect();
        for id in ids {
            let _ = self.disconnect(&id).await;
        }
    }
}

fn to_tool_definition(tool: &RmcpTool, server_id: &str) -> gcs_core::ToolDefinition {
    let parameters = serde_json::to_value(&*tool.input_schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    gcs_core::ToolDefinition::external(tool.name.to_string(), tool.description.as_deref().unwrap_or_default(), server_id)
        .with_parameters(parameters)
}

/// Deterministic id a caller can compute ahead of connecting, e.g. to check
/// whether a URL is already registered.
#[must_use]
pub fn server_id_for_url(url: &str) -> String {
    content_hash(url)
}
