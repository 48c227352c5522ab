//! The execution engine: one entry point, `execute`, owning the
//! pending → running → completed|failed lifecycle of a skill call.
//!
//! `execute` never returns `Err`. Every path, from lookup failures and
//! validation to strategy errors, ends in a structured [`ExecutionOutcome`]
//! the caller can hand straight to a chat turn, and the matching record
//! lands in the execution log. Progress streams to the caller's event sink
//! along the way; both the sink and the log are best-effort and never
//! decide the outcome.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use skillet_core::{
    apply_defaults, validate_call, ConfigStore, EngineError, EventStatus, ExecutionContext,
    ExecutionLogStore, ExecutionMetadata, ExecutionOutcome, PluginRegistry, RuntimeKind,
    SkillEvent, SkillExecution, SkillManifest,
};
use skillet_logging::{redact_config_json, ExecutionEvent, ExecutionLogger};

use crate::runtimes::{
    emit_event, ApiCallRuntime, ScriptRuntime, SkillCall, SkillRuntime, WebhookRuntime,
};
use crate::settings::EngineSettings;

pub struct SkillEngine {
    registry: Arc<dyn PluginRegistry>,
    configs: Arc<dyn ConfigStore>,
    log: Arc<dyn ExecutionLogStore>,
    api_call: ApiCallRuntime,
    script: ScriptRuntime,
    webhook: WebhookRuntime,
}

impl SkillEngine {
    pub fn new(
        registry: Arc<dyn PluginRegistry>,
        configs: Arc<dyn ConfigStore>,
        log: Arc<dyn ExecutionLogStore>,
    ) -> Self {
        Self::with_settings(registry, configs, log, EngineSettings::default())
    }

    pub fn with_settings(
        registry: Arc<dyn PluginRegistry>,
        configs: Arc<dyn ConfigStore>,
        log: Arc<dyn ExecutionLogStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            configs,
            log,
            api_call: ApiCallRuntime::new(
                Client::new(),
                settings.http_timeout,
                settings.user_agent.clone(),
            ),
            script: ScriptRuntime::new(settings.sandbox.clone()),
            webhook: WebhookRuntime::new(),
        }
    }

    /// Runs one skill call end to end and always returns a structured
    /// outcome. Concurrent calls are independent; the engine itself applies
    /// no admission control.
    pub async fn execute(
        &self,
        plugin_id: &str,
        function_name: &str,
        parameters: Map<String, Value>,
        context: ExecutionContext,
    ) -> ExecutionOutcome {
        let started = Instant::now();
        let mut record = SkillExecution::new(plugin_id, function_name, parameters);
        let metadata = ExecutionMetadata {
            plugin_id: plugin_id.to_string(),
            function_name: function_name.to_string(),
            execution_id: record.id,
        };

        info!(
            plugin = %plugin_id,
            function = %function_name,
            user = %context.user_id,
            execution = %record.id,
            "[Engine] executing skill"
        );
        debug!(
            execution = %record.id,
            parameters = %redact_config_json(&serde_json::Value::Object(record.parameters.clone())),
            "[Engine] call parameters"
        );

        emit_event(
            &context,
            SkillEvent::status(EventStatus::Pending, "Execution queued", false),
        )
        .await;
        self.log_create(&record).await;
        ExecutionLogger::log_event(
            &record.id.to_string(),
            &context.user_id,
            ExecutionEvent::Started {
                plugin_id: plugin_id.to_string(),
                function_name: function_name.to_string(),
            },
        );

        let result = self.run_inner(&mut record, &context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                record.complete(data.clone(), elapsed_ms);
                emit_event(
                    &context,
                    SkillEvent::status(EventStatus::Completed, "Execution completed", true),
                )
                .await;
                self.log_update(&record).await;
                ExecutionLogger::log_event(
                    &record.id.to_string(),
                    &context.user_id,
                    ExecutionEvent::Completed {
                        plugin_id: plugin_id.to_string(),
                        function_name: function_name.to_string(),
                        duration_ms: elapsed_ms,
                    },
                );
                info!(
                    execution = %record.id,
                    elapsed_ms = elapsed_ms,
                    "[Engine] execution completed"
                );
                ExecutionOutcome::success(data, elapsed_ms, metadata)
            }
            Err(err) => {
                let message = err.to_string();
                record.fail(message.clone(), elapsed_ms);
                emit_event(&context, SkillEvent::error(message.clone())).await;
                self.log_update(&record).await;
                ExecutionLogger::log_event(
                    &record.id.to_string(),
                    &context.user_id,
                    ExecutionEvent::Failed {
                        plugin_id: plugin_id.to_string(),
                        function_name: function_name.to_string(),
                        error: message.clone(),
                        duration_ms: elapsed_ms,
                    },
                );
                warn!(
                    execution = %record.id,
                    error = %message,
                    "[Engine] execution failed"
                );
                ExecutionOutcome::failure(message, elapsed_ms, metadata)
            }
        }
    }

    /// Lookup, validation, config resolution, the RUNNING transition, and
    /// strategy dispatch. Any error here drives the FAILED path in
    /// `execute`.
    async fn run_inner(
        &self,
        record: &mut SkillExecution,
        context: &ExecutionContext,
    ) -> Result<Value, EngineError> {
        let plugin = self
            .registry
            .find_by_id(&record.plugin_id)
            .await?
            .ok_or_else(|| EngineError::PluginNotFound(record.plugin_id.clone()))?;

        if !plugin.is_active {
            return Err(EngineError::PluginInactive(record.plugin_id.clone()));
        }

        let manifest = SkillManifest::try_from(&plugin.manifest).map_err(|err| {
            EngineError::Configuration(format!(
                "invalid manifest for plugin '{}': {err}",
                record.plugin_id
            ))
        })?;

        let function = manifest.function(&record.function_name).ok_or_else(|| {
            EngineError::FunctionNotFound {
                plugin: record.plugin_id.clone(),
                function: record.function_name.clone(),
            }
        })?;

        let violations = validate_call(function, &record.parameters);
        if !violations.is_empty() {
            return Err(EngineError::Validation(violations));
        }

        let config = self
            .configs
            .resolved_config(&record.plugin_id, &context.user_id)
            .await
            .map_err(|err| EngineError::Configuration(err.to_string()))?;
        debug!(
            execution = %record.id,
            config = %redact_config_json(&config.to_value()),
            "[Engine] resolved config"
        );

        let arguments = apply_defaults(function, &record.parameters);

        record.mark_running();
        self.log_update(record).await;
        emit_event(
            context,
            SkillEvent::status(
                EventStatus::InProgress,
                format!("Executing {}", record.function_name),
                false,
            ),
        )
        .await;

        let call = SkillCall {
            plugin_id: &record.plugin_id,
            manifest: &manifest,
            function,
            arguments: &arguments,
            config: &config,
            context,
        };

        match plugin.runtime_kind {
            RuntimeKind::ApiCall => self.api_call.invoke(call).await,
            RuntimeKind::Nodejs => self.script.invoke(call).await,
            RuntimeKind::Webhook => self.webhook.invoke(call).await,
            RuntimeKind::Unknown(other) => Err(EngineError::UnsupportedRuntime(other)),
        }
    }

    async fn log_create(&self, record: &SkillExecution) {
        if let Err(err) = self.log.create(record).await {
            warn!(
                execution = %record.id,
                error = %err,
                "[Engine] failed to create execution record"
            );
        }
    }

    async fn log_update(&self, record: &SkillExecution) {
        if let Err(err) = self.log.update(record).await {
            warn!(
                execution = %record.id,
                error = %err,
                "[Engine] failed to update execution record"
            );
        }
    }
}
