//! Persistent store for [`ServerRecord`]s: a single consolidated
//! `external_agents_registry.json`, written atomically.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{McpError, McpResult};
use crate::types::ServerRecord;

/// Where the registry file lives.
#[derive(Debug, Clone)]
pub struct RegistryStoreConfig {
    /// Path to the registry JSON file.
    pub path: PathBuf,
}

impl RegistryStoreConfig {
    /// Resolve the default location: `RUNTIME_DATA_DIR`/`external_agents_registry.json`
    /// if set, otherwise the user-home default.
    #[must_use]
    pub fn resolve() -> Self {
        let path = std::env::var("RUNTIME_DATA_DIR")
            .ok()
            .map(|d| PathBuf::from(d).join("external_agents_registry.json"))
            .unwrap_or_else(|| {
                directories::BaseDirs::new()
                    .map(|b| b.home_dir().join(".gcs").join("external_agents_registry.json"))
                    .unwrap_or_else(|| PathBuf::from("external_agents_registry.json"))
            });
        Self { path }
    }
}

/// Persistent, consolidated registry of configured MCP servers.
pub struct RegistryStore {
    path: PathBuf,
    records: RwLock<HashMap<String, ServerRecord>>,
}

impl RegistryStore {
    /// Load the registry from disk, or start empty if no file exists yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(config: RegistryStoreConfig) -> McpResult<Self> {
        let records = if config.path.exists() {
            let raw = fs::read_to_string(&config.path)?;
            serde_json::from_str(&raw).map_err(|e| McpError::Corrupt(e.to_string()))?
        } else {
            HashMap::new()
        };
        Ok(Self { path: config.path, records: RwLock::new(records) })
    }

    /// Insert or replace a record, then persist.
    pub async fn upsert(&self, record: ServerRecord) -> McpResult<()> {
        let mut guard = self.records.write().await;
        guard.insert(record.server_id.clone(), record);
        self.persist(&guard)
    }

    /// Remove a record, then persist.
    pub async fn remove(&self, server_id: &str) -> McpResult<()> {
        let mut guard = self.records.write().await;
        guard.remove(server_id);
        self.persist(&guard)
    }

    /// All records currently known, regardless of live connection state.
    pub async fn all(&self) -> Vec<ServerRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Records whose last known status was `active`, used to drive
    /// reconnection at startup.
    pub async fn previously_active(&self) -> Vec<ServerRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.status == crate::types::ServerStatus::Active)
            .cloned()
            .collect()
    }

    fn persist(&self, records: &HashMap<String, ServerRecord>) -> McpResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(records).map_err(|e| McpError::Corrupt(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), count = records.len(), "server registry persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_then_reload_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let store = RegistryStore::load(RegistryStoreConfig { path: path.clone() }).unwrap();
        let record = ServerRecord::stdio("fs", "npx", vec!["-y".into()]);
        let id = record.server_id.clone();
        store.upsert(record).await.unwrap();

        let reloaded = RegistryStore::load(RegistryStoreConfig { path }).unwrap();
        let all = reloaded.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].server_id, id);
    }

    #[tokio::test]
    async fn remove_drops_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let store = RegistryStore::load(RegistryStoreConfig { path }).unwrap();
        let record = ServerRecord::stdio("fs", "npx", vec![]);
        let id = record.server_id.clone();
        store.upsert(record).await.unwrap();
        store.remove(&id).await.unwrap();
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn previously_active_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let store = RegistryStore::load(RegistryStoreConfig { path }).unwrap();

        let mut active = ServerRecord::stdio("a", "cmd", vec![]);
        active.status = crate::types::ServerStatus::Active;
        let mut inactive = ServerRecord::stdio("b", "cmd2", vec![]);
        inactive.status = crate::types::ServerStatus::Disconnected;

        store.upsert(active.clone()).await.unwrap();
        store.upsert(inactive).await.unwrap();

        let result = store.previously_active().await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].server_id, active.server_id);
    }
}
