//! In-memory store implementations.
//!
//! Reference backing for the engine's storage traits: enough for tests,
//! demos, and single-process deployments that don't want a database.
//! Production services implement the same traits over their own storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use skillet_core::{
    ConfigStore, ExecutionLogStore, PluginRecord, PluginRegistry, ResolvedConfig, SkillExecution,
};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryRegistry {
    plugins: RwLock<HashMap<String, PluginRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: PluginRecord) {
        self.plugins.write().await.insert(record.id.clone(), record);
    }

    pub async fn remove(&self, plugin_id: &str) -> bool {
        self.plugins.write().await.remove(plugin_id).is_some()
    }
}

#[async_trait]
impl PluginRegistry for InMemoryRegistry {
    async fn find_by_id(&self, plugin_id: &str) -> anyhow::Result<Option<PluginRecord>> {
        Ok(self.plugins.read().await.get(plugin_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

/// Keyed by (plugin, user); a missing entry resolves to an empty config,
/// matching a user who never configured the plugin.
#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<(String, String), ResolvedConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, plugin_id: &str, user_id: &str, config: ResolvedConfig) {
        self.configs
            .write()
            .await
            .insert((plugin_id.to_string(), user_id.to_string()), config);
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn resolved_config(
        &self,
        plugin_id: &str,
        user_id: &str,
    ) -> anyhow::Result<ResolvedConfig> {
        Ok(self
            .configs
            .read()
            .await
            .get(&(plugin_id.to_string(), user_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Execution log
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryExecutionLog {
    records: RwLock<HashMap<Uuid, SkillExecution>>,
}

impl InMemoryExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, execution_id: Uuid) -> Option<SkillExecution> {
        self.records.read().await.get(&execution_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ExecutionLogStore for InMemoryExecutionLog {
    async fn create(&self, execution: &SkillExecution) -> anyhow::Result<()> {
        self.records
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &SkillExecution) -> anyhow::Result<()> {
        self.records
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use skillet_core::{ExecutionStatus, RuntimeKind};

    #[tokio::test]
    async fn registry_insert_and_lookup() {
        let registry = InMemoryRegistry::new();
        registry
            .insert(PluginRecord {
                id: "weather".into(),
                manifest: json!({ "name": "weather", "functions": [] }),
                runtime_kind: RuntimeKind::ApiCall,
                is_active: true,
            })
            .await;

        let found = registry.find_by_id("weather").await.unwrap();
        assert!(found.is_some());
        assert!(registry.find_by_id("missing").await.unwrap().is_none());
        assert!(registry.remove("weather").await);
        assert!(registry.find_by_id("weather").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn config_store_scopes_by_plugin_and_user() {
        let store = InMemoryConfigStore::new();
        store
            .set(
                "weather",
                "user-1",
                [("api_key".to_string(), json!("sk-one"))].into_iter().collect(),
            )
            .await;

        let resolved = store.resolved_config("weather", "user-1").await.unwrap();
        assert_eq!(resolved.api_key(), Some("sk-one"));

        // A different user sees an empty config, not user-1's secrets.
        let other = store.resolved_config("weather", "user-2").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn execution_log_upserts_by_id() {
        let log = InMemoryExecutionLog::new();
        let mut record = SkillExecution::new("weather", "current", Map::new());
        log.create(&record).await.unwrap();
        assert_eq!(log.len().await, 1);

        record.mark_running();
        record.complete(json!({ "temp": 21 }), 12);
        log.update(&record).await.unwrap();

        let stored = log.get(record.id).await.unwrap();
        assert_eq!(stored.status, ExecutionStatus::Completed);
        assert_eq!(stored.execution_time_ms, Some(12));
        assert_eq!(log.len().await, 1);
    }
}
