//! The Tool Registry: the single catalogue of callable tools, shared by the
//! gateway (for schema export), the execution manager (for lookup/routing),
//! and the MCP connection manager (for external tool registration).
//!
//! The registry itself never executes a tool; it only catalogues
//! definitions and notifies observers of changes.

use gcs_core::ToolDefinition;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::event::RegistryEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Shared, read-mostly catalogue of tool definitions.
#[derive(Clone)]
pub struct ToolRegistry {
    inner: Arc<RwLock<HashMap<String, ToolDefinition>>>,
    sender: broadcast::Sender<RegistryEvent>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            sender,
        }
    }

    /// Subscribe to registry change notifications.
    #[must_use]
    pub fn subscribe(&self) -> RegistryEventReceiver {
        RegistryEventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Register a tool. Re-registering the same name replaces the
    /// definition and emits `ToolUpdated` rather than `ToolAdded`
    /// (idempotent by name, not a duplicate-registration error).
    pub async fn register(&self, definition: ToolDefinition) {
        let name = definition.name.clone();
        let mut guard = self.inner.write().await;
        let event = if guard.insert(name.clone(), definition).is_some() {
            RegistryEvent::ToolUpdated { name: name.clone() }
        } else {
            RegistryEvent::ToolAdded { name: name.clone() }
        };
        drop(guard);
        debug!(tool = %name, event = event.name(), "registry updated");
        let _ = self.sender.send(event);
    }

    /// Remove a tool by name, returning its prior definition if present.
    pub async fn unregister(&self, name: &str) -> Option<ToolDefinition> {
        let mut guard = self.inner.write().await;
        let removed = guard.remove(name);
        drop(guard);
        if removed.is_some() {
            debug!(tool = name, "tool unregistered");
            let _ = self.sender.send(RegistryEvent::ToolRemoved { name: name.to_string() });
        }
        removed
    }

    /// Remove every external tool whose `origin` matches `server_id`.
    ///
    /// Called by the MCP connection manager when a server disconnects, so
    /// that no tool is left pointing at a dead connection.
    pub async fn unregister_by_origin(&self, server_id: &str) -> Vec<ToolDefinition> {
        let mut guard = self.inner.write().await;
        let names: Vec<String> = guard
            .values()
            .filter(|t| t.origin.as_deref() == Some(server_id))
            .map(|t| t.name.clone())
            .collect();
        let mut removed = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(def) = guard.remove(name) {
                removed.push(def);
            }
        }
        drop(guard);
        for name in &names {
            let _ = self.sender.send(RegistryEvent::ToolRemoved { name: name.clone() });
        }
        if !names.is_empty() {
            debug!(server_id, count = names.len(), "detached tools for disconnected origin");
        }
        removed
    }

    /// Look up a tool definition by name.
    pub async fn get(&self, name: &str) -> Option<ToolDefinition> {
        self.inner.read().await.get(name).cloned()
    }

    /// Whether a name is currently registered.
    pub async fn has(&self, name: &str) -> bool {
        self.inner.read().await.contains_key(name)
    }

    /// A snapshot of every registered definition, for gateway schema export.
    pub async fn snapshot_all(&self) -> Vec<ToolDefinition> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Number of registered tools.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the registry has no tools.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove every tool, regardless of kind. Used when loading a named
    /// configuration replaces the whole tool set.
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        let names: Vec<String> = guard.keys().cloned().collect();
        guard.clear();
        drop(guard);
        for name in names {
            let _ = self.sender.send(RegistryEvent::ToolRemoved { name });
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiver of [`RegistryEvent`]s.
pub struct RegistryEventReceiver {
    receiver: broadcast::Receiver<RegistryEvent>,
}

impl RegistryEventReceiver {
    /// Await the next registry change. Returns `None` once the registry and
    /// all its clones are dropped.
    pub async fn recv(&mut self) -> Option<RegistryEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_get() {
        let registry = ToolRegistry::new();
        registry.register(ToolDefinition::local("ping", "pings")).await;
        assert!(registry.has("ping").await);
        assert_eq!(registry.get("ping").await.unwrap().name, "ping");
    }

    #[tokio::test]
    async fn re_registering_is_idempotent_and_emits_updated() {
        let registry = ToolRegistry::new();
        let mut rx = registry.subscribe();
        registry.register(ToolDefinition::local("ping", "v1")).await;
        registry.register(ToolDefinition::local("ping", "v2")).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get("ping").await.unwrap().description, "v2");

        assert!(matches!(rx.recv().await.unwrap(), RegistryEvent::ToolAdded { .. }));
        assert!(matches!(rx.recv().await.unwrap(), RegistryEvent::ToolUpdated { .. }));
    }

    #[tokio::test]
    async fn unregister_external_detaches_by_origin() {
        let registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::external("weather", "gets weather", "server-1"))
            .await;
        registry
            .register(ToolDefinition::external("news", "gets news", "server-1"))
            .await;
        registry.register(ToolDefinition::local("ping", "pings")).await;

        let removed = registry.unregister_by_origin("server-1").await;
        assert_eq!(removed.len(), 2);
        assert!(!registry.has("weather").await);
        assert!(!registry.has("news").await);
        assert!(registry.has("ping").await);
    }

    #[tokio::test]
    async fn unregister_missing_returns_none_and_emits_nothing() {
        let registry = ToolRegistry::new();
        let mut rx = registry.subscribe();
        assert!(registry.unregister("nope").await.is_none());
        drop(registry);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let registry = ToolRegistry::new();
        registry.register(ToolDefinition::local("a", "a")).await;
        registry.register(ToolDefinition::local("b", "b")).await;
        registry.clear().await;
        assert!(registry.is_empty().await);
    }
}
