//! Storage traits the engine depends on.
//!
//! The engine never talks to a database directly. The app wires in whatever
//! backs these traits: Postgres in production, the in-memory stores from
//! `skillet-engine` in tests. All methods return `anyhow::Result` because
//! storage failures are infrastructure problems, not domain errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ResolvedConfig;
use crate::execution::SkillExecution;
use crate::manifest::RuntimeKind;

/// A plugin as stored: raw manifest JSON plus the fields the engine needs
/// before it bothers parsing the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    pub id: String,
    pub manifest: Value,
    pub runtime_kind: RuntimeKind,
    pub is_active: bool,
}

/// Looks plugins up by id.
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    async fn find_by_id(&self, plugin_id: &str) -> anyhow::Result<Option<PluginRecord>>;
}

/// Resolves the merged configuration for a (plugin, user) pair.
///
/// Precedence between shared plugin settings and per-user values is this
/// store's business; the engine treats the result as final.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn resolved_config(
        &self,
        plugin_id: &str,
        user_id: &str,
    ) -> anyhow::Result<ResolvedConfig>;
}

/// Persists execution records. The engine calls `create` once per execution
/// and `update` on every status change, and logs rather than fails when a
/// call errors: history must never decide whether a skill runs.
#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    async fn create(&self, execution: &SkillExecution) -> anyhow::Result<()>;
    async fn update(&self, execution: &SkillExecution) -> anyhow::Result<()>;
}
