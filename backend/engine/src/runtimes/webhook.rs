//! Webhook strategy placeholder.
//!
//! The runtime kind is reserved in stored plugin records, so the engine
//! keeps an implementation slot for it, but every invocation fails with the
//! same message until delivery semantics are settled.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use skillet_core::EngineError;

use super::{SkillCall, SkillRuntime};

#[derive(Default)]
pub struct WebhookRuntime;

impl WebhookRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SkillRuntime for WebhookRuntime {
    async fn invoke(&self, call: SkillCall<'_>) -> Result<Value, EngineError> {
        debug!(plugin = %call.plugin_id, "[Webhook] invocation rejected");
        Err(EngineError::WebhookNotImplemented)
    }
}
