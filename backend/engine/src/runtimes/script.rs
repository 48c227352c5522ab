//! Sandboxed-script strategy for `nodejs` plugins.
//!
//! Hands the manifest's bundled source to the QuickJS sandbox on a blocking
//! worker thread. When the caller's resolved config carries an `api_key`,
//! a model client is built for that call alone and injected into the
//! sandbox; credentials are never written anywhere shared.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use skillet_core::EngineError;
use skillet_sandbox::{run_function, ModelClient, SandboxCapabilities, SandboxLimits};

use super::{SkillCall, SkillRuntime};

pub struct ScriptRuntime {
    limits: SandboxLimits,
}

impl ScriptRuntime {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SkillRuntime for ScriptRuntime {
    async fn invoke(&self, call: SkillCall<'_>) -> Result<Value, EngineError> {
        let source = call.manifest.source_code.clone().ok_or_else(|| {
            EngineError::Configuration(format!(
                "plugin '{}' has no bundled source code",
                call.plugin_id
            ))
        })?;

        let mut caps = SandboxCapabilities::new(
            call.manifest.name.clone(),
            Value::Object(call.arguments.clone()),
            call.config.to_value(),
        );
        if let Some(api_key) = call.config.api_key() {
            let mut model = ModelClient::new(api_key, self.limits.fetch_timeout)
                .map_err(|err| EngineError::Configuration(err.to_string()))?;
            if let Some(base_url) = call.config.get_str("api_base") {
                model = model.with_base_url(base_url);
            }
            if let Some(name) = call.config.get_str("model") {
                model = model.with_model(name);
            }
            caps = caps.with_model(model);
        }

        debug!(
            plugin = %call.plugin_id,
            function = %call.function.name,
            "[Script] dispatching to sandbox"
        );

        let function_name = call.function.name.clone();
        let limits = self.limits.clone();
        let result = tokio::task::spawn_blocking(move || {
            run_function(&source, &function_name, &caps, &limits)
        })
        .await
        .map_err(|err| EngineError::Runtime(format!("sandbox task failed: {err}")))?;

        result.map_err(|err| EngineError::Runtime(err.to_string()))
    }
}
