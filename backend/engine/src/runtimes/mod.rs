//! Execution strategies, one per runtime kind.
//!
//! The engine resolves a plugin's [`RuntimeKind`](skillet_core::RuntimeKind)
//! to exactly one of the types here and invokes it through [`SkillRuntime`].
//! The match in the engine is exhaustive, so adding a runtime kind forces a
//! decision at compile time instead of falling through a string comparison.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use skillet_core::{
    EngineError, ExecutionContext, FunctionDef, ResolvedConfig, SkillEvent, SkillManifest,
};

pub mod api_call;
pub mod script;
pub mod webhook;

pub use api_call::ApiCallRuntime;
pub use script::ScriptRuntime;
pub use webhook::WebhookRuntime;

/// Everything a strategy needs for one invocation. Borrowed from the
/// engine's per-call state; strategies never outlive the call.
pub struct SkillCall<'a> {
    pub plugin_id: &'a str,
    pub manifest: &'a SkillManifest,
    pub function: &'a FunctionDef,
    /// Validated arguments with schema defaults already applied.
    pub arguments: &'a Map<String, Value>,
    pub config: &'a ResolvedConfig,
    pub context: &'a ExecutionContext,
}

/// Uniform invocation surface over the three execution strategies.
#[async_trait]
pub trait SkillRuntime: Send + Sync {
    async fn invoke(&self, call: SkillCall<'_>) -> Result<Value, EngineError>;
}

/// Sends one event to the caller's sink, when present. Delivery is
/// best-effort: a closed channel is logged and ignored, so an execution's
/// outcome never depends on who is listening.
pub(crate) async fn emit_event(context: &ExecutionContext, event: SkillEvent) {
    if let Some(sink) = &context.event_sink {
        if sink.send(event).await.is_err() {
            warn!("[Engine] event sink closed; dropping event");
        }
    }
}
