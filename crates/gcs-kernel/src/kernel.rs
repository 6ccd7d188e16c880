//! The Kernel: constructs the full component graph from [`Settings`] and
//! owns the lifecycle operations that span every open conversation.

use async_trait::async_trait;
use gcs_auth::{CredentialStore, CredentialStoreConfig, DeviceFlowClient, DeviceFlowConfig};
use gcs_config::Settings;
use gcs_core::{ErrorKind, GcsError, RuntimeHandle, ToolDefinition, ToolResult};
use gcs_conversation::{ConversationStore, ConversationStoreConfig};
use gcs_events::EventBus;
use gcs_execution::{AlwaysDeny, ApprovalGate, ExecutionManager};
use gcs_gateway::ContextualLlmGateway;
use gcs_llm::{LlmProvider, OAuthTokenSource, OpenAiCompatProvider, ProviderConfig, StaticToken, TokenSource};
use gcs_mcp::{ConnectionManager, RegistryStore, RegistryStoreConfig};
use gcs_orchestrator::{Orchestrator, OrchestratorResult, TurnOutcome};
use gcs_registry::ToolRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::catalog::builtin_tool;
use crate::error::{KernelError, KernelResult};

const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// Owns every shared collaborator plus one [`Orchestrator`] per open
/// conversation.
pub struct Kernel {
    settings: Settings,
    registry: ToolRegistry,
    mcp: Arc<ConnectionManager>,
    execution: Arc<ExecutionManager>,
    approval: Arc<ApprovalGate>,
    gateway: Arc<ContextualLlmGateway>,
    credentials: Arc<CredentialStore>,
    conversations: RwLock<HashMap<String, Arc<Orchestrator>>>,
    loaded_tools: RwLock<Vec<String>>,
    default_domain_context: RwLock<Option<String>>,
    notifications: broadcast::Sender<String>,
}

impl Kernel {
    /// Build the full component graph, reconnect any MCP servers active at
    /// last shutdown, and start the health-check loop.
    ///
    /// # Errors
    /// Returns a [`KernelError`] if the persisted server registry is
    /// corrupt.
    pub async fn new(settings: Settings) -> KernelResult<Arc<Self>> {
        let registry = ToolRegistry::new();

        let approval = Arc::new(ApprovalGate::new());
        approval.set_handler(Arc::new(AlwaysDeny)).await;

        let registry_store = RegistryStore::load(RegistryStoreConfig {
            path: settings.runtime_data_dir.join("external_agents_registry.json"),
        })?;
        let mcp = Arc::new(ConnectionManager::new(registry.clone(), registry_store));
        mcp.reconnect_previously_active().await;
        mcp.start_health_check_loop().await;

        let execution = Arc::new(
            ExecutionManager::new(registry.clone(), Arc::clone(&approval)).with_mcp(Arc::clone(&mcp)),
        );

        let credentials = Arc::new(CredentialStore::with_config(CredentialStoreConfig {
            path: settings.runtime_data_dir.join("oauth_creds.json"),
            lock_timeout: std::time::Duration::from_secs(10),
        }));

        let provider = build_provider(&settings, Arc::clone(&credentials));
        let gateway = Arc::new(ContextualLlmGateway::new(provider, registry.clone()));

        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);

        let kernel = Arc::new(Self {
            settings,
            registry,
            mcp,
            execution,
            approval,
            gateway,
            credentials,
            conversations: RwLock::new(HashMap::new()),
            loaded_tools: RwLock::new(Vec::new()),
            default_domain_context: RwLock::new(None),
            notifications,
        });

        kernel.execution.set_runtime(Arc::clone(&kernel) as Arc<dyn RuntimeHandle>).await;

        Ok(kernel)
    }

    /// Subscribe to kernel-wide notifications (e.g. `configuration_changed`).
    #[must_use]
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<String> {
        self.notifications.subscribe()
    }

    /// Load a named configuration: swap the registered tool set, clear
    /// every open conversation, and adopt its domain context for
    /// conversations opened from now on.
    ///
    /// # Errors
    /// Returns [`KernelError::Config`] if no manifest exists under this
    /// name, or [`KernelError::UnknownTool`] if it names a tool outside the
    /// built-in catalog.
    pub async fn load_configuration(&self, name: &str) -> KernelResult<()> {
        let manifest = gcs_config::load_from(&self.settings.config_dir, name)?;

        let mut resolved = Vec::with_capacity(manifest.tools.len());
        for tool_name in &manifest.tools {
            let pair = builtin_tool(tool_name).ok_or_else(|| KernelError::UnknownTool(tool_name.clone()))?;
            resolved.push((tool_name.clone(), pair));
        }

        {
            let mut loaded = self.loaded_tools.write().await;
            for tool_name in loaded.drain(..) {
                self.registry.unregister(&tool_name).await;
            }
        }

        let mut newly_loaded = Vec::with_capacity(resolved.len());
        for (tool_name, (definition, handler)) in resolved {
            self.registry.register(definition).await;
            self.execution.register_local(tool_name.clone(), handler).await;
            newly_loaded.push(tool_name);
        }
        *self.loaded_tools.write().await = newly_loaded;
        *self.default_domain_context.write().await = manifest.domain_context;

        self.conversations.write().await.clear();

        info!(config = %name, tool_count = manifest.tools.len(), "configuration loaded");
        self.notify("configuration_changed");
        Ok(())
    }

    /// Names of every configuration manifest available under `CONFIG_DIR`.
    pub async fn list_configurations_detail(&self) -> Vec<String> {
        gcs_config::list_from(&self.settings.config_dir).unwrap_or_default()
    }

    /// Get or open the named conversation, seeding a freshly-opened one
    /// with the active configuration's domain context.
    pub async fn conversation(&self, conversation_id: impl Into<String>) -> Arc<Orchestrator> {
        let conversation_id = conversation_id.into();
        if let Some(existing) = self.conversations.read().await.get(&conversation_id) {
            return Arc::clone(existing);
        }

        let mut conversations = self.conversations.write().await;
        if let Some(existing) = conversations.get(&conversation_id) {
            return Arc::clone(existing);
        }

        let store = Arc::new(ConversationStore::with_config(ConversationStoreConfig {
            max_context_chars: self.settings.compression_threshold,
            max_history_length: self.settings.max_history_length,
        }));
        store.set_domain_context(self.default_domain_context.read().await.clone()).await;

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&self.gateway),
            store,
            Arc::clone(&self.execution),
            EventBus::new(),
        ));
        conversations.insert(conversation_id, Arc::clone(&orchestrator));
        orchestrator
    }

    /// Run one turn of the named conversation, opening it first if needed.
    ///
    /// # Errors
    /// See [`Orchestrator::run_turn`].
    pub async fn send_message(
        &self,
        conversation_id: impl Into<String>,
        input: impl Into<String>,
    ) -> OrchestratorResult<TurnOutcome> {
        let orchestrator = self.conversation(conversation_id).await;
        orchestrator.run_turn(input, &CancellationToken::new()).await
    }

    /// Disconnect every MCP server, stop the health-check loop, and flush
    /// the in-memory credential cache (stored credentials are left on disk
    /// so the next process start does not require re-authenticating).
    pub async fn shutdown(&self) {
        self.mcp.shutdown().await;
        self.credentials.invalidate_cache().await;
        info!("kernel shutdown complete");
    }
}

#[async_trait]
impl RuntimeHandle for Kernel {
    async fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.registry.get(name).await
    }

    async fn call_tool(&self, name: &str, parameters: Value) -> Result<ToolResult, GcsError> {
        let execution = self.execution.execute(name, parameters).await;
        execution
            .result
            .ok_or_else(|| GcsError::new(ErrorKind::ExecutionFailed, "execution completed without a result"))
    }

    async fn list_configurations(&self) -> Vec<String> {
        self.list_configurations_detail().await
    }

    fn notify(&self, event: &str) {
        let _ = self.notifications.send(event.to_string());
    }
}

fn build_provider(settings: &Settings, credentials: Arc<CredentialStore>) -> Arc<dyn LlmProvider> {
    let mut config = match &settings.llm_base_url {
        Some(base_url) => ProviderConfig::custom(base_url.clone(), settings.llm_model.clone()),
        None => ProviderConfig::openai(settings.llm_model.clone()),
    };
    config.max_context = settings.max_context_size;
    config.timeout = settings.llm_timeout;

    let token_source = build_token_source(settings, credentials);
    Arc::new(OpenAiCompatProvider::new(config, token_source))
}

fn build_token_source(settings: &Settings, credentials: Arc<CredentialStore>) -> Arc<dyn TokenSource> {
    if let Some(api_key) = &settings.llm_api_key {
        return Arc::new(StaticToken(api_key.clone()));
    }
    if let (Some(client_id), Some(authorization_server)) =
        (&settings.qwen_client_id, &settings.qwen_authorization_server)
    {
        let device_flow = Arc::new(DeviceFlowClient::new(DeviceFlowConfig {
            client_id: client_id.clone(),
            authorization_server: authorization_server.clone(),
        }));
        return Arc::new(OAuthTokenSource::new(credentials, device_flow));
    }
    Arc::new(StaticToken(String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(dir: &std::path::Path) -> Settings {
        Settings {
            config_dir: dir.join("configs"),
            agents_dir: dir.join("agents"),
            runtime_data_dir: dir.join("data"),
            llm_model: "gpt-4o-mini".to_string(),
            llm_base_url: None,
            llm_api_key: Some("test-key".to_string()),
            llm_timeout: std::time::Duration::from_secs(5),
            max_context_size: 4096,
            max_history_length: 10,
            compression_threshold: 2000,
            qwen_client_id: None,
            qwen_authorization_server: None,
        }
    }

    #[tokio::test]
    async fn new_kernel_starts_with_no_registered_tools() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = Kernel::new(test_settings(dir.path())).await.unwrap();
        assert!(kernel.get_tool("website_check").await.is_none());
    }

    #[tokio::test]
    async fn load_configuration_registers_its_tools_and_rejects_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let configs_dir = dir.path().join("configs");
        std::fs::create_dir_all(&configs_dir).unwrap();
        std::fs::write(
            configs_dir.join("ops.toml"),
            "name = \"ops\"\ntools = [\"website_check\", \"dns_lookup\"]\ndomain_context = \"You help with networking.\"\n",
        )
        .unwrap();
        std::fs::write(configs_dir.join("bad.toml"), "name = \"bad\"\ntools = [\"does_not_exist\"]\n").unwrap();

        let kernel = Kernel::new(test_settings(dir.path())).await.unwrap();

        kernel.load_configuration("ops").await.unwrap();
        assert!(kernel.get_tool("website_check").await.is_some());
        assert!(kernel.get_tool("dns_lookup").await.is_some());

        let err = kernel.load_configuration("bad").await.unwrap_err();
        assert!(matches!(err, KernelError::UnknownTool(name) if name == "does_not_exist"));
    }

    #[tokio::test]
    async fn loading_a_configuration_clears_open_conversations() {
        let dir = tempfile::tempdir().unwrap();
        let configs_dir = dir.path().join("configs");
        std::fs::create_dir_all(&configs_dir).unwrap();
        std::fs::write(configs_dir.join("a.toml"), "name = \"a\"\ntools = []\n").unwrap();

        let kernel = Kernel::new(test_settings(dir.path())).await.unwrap();
        let first = kernel.conversation("session-1").await;
        kernel.load_configuration("a").await.unwrap();
        let second = kernel.conversation("session-1").await;
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn list_configurations_detail_reflects_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let configs_dir = dir.path().join("configs");
        std::fs::create_dir_all(&configs_dir).unwrap();
        std::fs::write(configs_dir.join("a.toml"), "name = \"a\"\n").unwrap();
        std::fs::write(configs_dir.join("b.toml"), "name = \"b\"\n").unwrap();

        let kernel = Kernel::new(test_settings(dir.path())).await.unwrap();
        assert_eq!(kernel.list_configurations_detail().await, vec!["a".to_string(), "b".to_string()]);
    }
}
