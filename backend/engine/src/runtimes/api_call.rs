//! HTTP proxy strategy for `api_call` plugins.
//!
//! Builds one POST to the manifest's endpoint from the validated arguments
//! plus resolved config, and normalizes the handful of response shapes seen
//! in the wild: a `data` envelope is unwrapped, and image-generation
//! responses additionally stream one `message` event per image before
//! returning an aggregate summary.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;

use skillet_core::{EngineError, ResolvedConfig, SkillEvent};

use super::{emit_event, SkillCall, SkillRuntime};

/// `{key}` tokens in endpoint templates, e.g. `https://api.host/{model}/run`.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

pub struct ApiCallRuntime {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl ApiCallRuntime {
    pub fn new(client: Client, default_timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            default_timeout,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl SkillRuntime for ApiCallRuntime {
    async fn invoke(&self, call: SkillCall<'_>) -> Result<Value, EngineError> {
        let template = call.manifest.endpoint.as_deref().ok_or_else(|| {
            EngineError::Configuration(format!(
                "plugin '{}' declares no endpoint",
                call.plugin_id
            ))
        })?;

        let endpoint = fill_placeholders(template, call.config);
        url::Url::parse(&endpoint).map_err(|err| {
            EngineError::Configuration(format!("invalid endpoint '{endpoint}': {err}"))
        })?;

        let body = build_body(call.function.parameters.keys(), call.arguments, call.config);

        let timeout = call
            .config
            .get_u64("timeout_ms")
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        debug!(
            plugin = %call.plugin_id,
            endpoint = %endpoint,
            timeout_ms = timeout.as_millis() as u64,
            "[ApiCall] POST"
        );

        let mut request = self
            .client
            .post(&endpoint)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .json(&body);
        if let Some(api_key) = call.config.api_key() {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| EngineError::Runtime(format!("HTTP request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(EngineError::Runtime(format!(
                "endpoint returned {status}: {error_body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| EngineError::Runtime(format!("invalid JSON response: {err}")))?;

        Ok(normalize_response(payload, &call).await)
    }
}

// ---------------------------------------------------------------------------
// Request assembly
// ---------------------------------------------------------------------------

/// Replaces `{key}` tokens with config values; unknown keys are left intact
/// so a misconfigured plugin fails visibly at URL parsing, not silently.
fn fill_placeholders(template: &str, config: &ResolvedConfig) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match config.get(&caps[1]) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        })
        .to_string()
}

/// Arguments win; config fills only parameters the schema declares and the
/// caller omitted. Undeclared config keys never leak into the request.
fn build_body<'a>(
    declared: impl Iterator<Item = &'a String>,
    arguments: &Map<String, Value>,
    config: &ResolvedConfig,
) -> Map<String, Value> {
    let mut body = arguments.clone();
    for name in declared {
        if !body.contains_key(name) {
            if let Some(value) = config.get(name) {
                body.insert(name.clone(), value.clone());
            }
        }
    }
    body
}

// ---------------------------------------------------------------------------
// Response normalization
// ---------------------------------------------------------------------------

/// Unwraps a `{"data": ...}` envelope; anything else passes through.
fn unwrap_data_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

async fn normalize_response(payload: Value, call: &SkillCall<'_>) -> Value {
    let payload = unwrap_data_envelope(payload);

    if let Some(images) = payload.get("images").and_then(Value::as_array) {
        let total_pixels = images.iter().fold(0u64, |total, image| {
            let width = image.get("width").and_then(Value::as_u64).unwrap_or(0);
            let height = image.get("height").and_then(Value::as_u64).unwrap_or(0);
            total.saturating_add(width.saturating_mul(height))
        });

        for (index, image) in images.iter().enumerate() {
            if let Some(url) = image.get("url").and_then(Value::as_str) {
                emit_event(
                    call.context,
                    SkillEvent::message(format!("![Generated image {}]({url})", index + 1)),
                )
                .await;
            }
        }

        debug!(
            plugin = %call.plugin_id,
            count = images.len(),
            "[ApiCall] image response normalized"
        );

        return json!({
            "images": images,
            "metadata": {
                "generated_images": images.len(),
                "total_pixels": total_pixels,
            }
        });
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, Value)]) -> ResolvedConfig {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn placeholders_take_config_values() {
        let config = config(&[("model", json!("flux-dev")), ("steps", json!(20))]);
        assert_eq!(
            fill_placeholders("https://api.host/models/{model}/run", &config),
            "https://api.host/models/flux-dev/run"
        );
        // Non-string values are rendered as JSON.
        assert_eq!(
            fill_placeholders("https://api.host/run?steps={steps}", &config),
            "https://api.host/run?steps=20"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_intact() {
        let config = ResolvedConfig::new();
        assert_eq!(
            fill_placeholders("https://api.host/{model}/run", &config),
            "https://api.host/{model}/run"
        );
    }

    #[test]
    fn config_fills_only_declared_missing_parameters() {
        let declared = ["style".to_string(), "prompt".to_string()];
        let mut arguments = Map::new();
        arguments.insert("prompt".into(), json!("a cat"));
        let config = config(&[
            ("style", json!("vivid")),
            ("prompt", json!("config prompt")),
            ("api_key", json!("sk-secret")),
        ]);

        let body = build_body(declared.iter(), &arguments, &config);
        // Caller's value wins; declared-but-omitted comes from config;
        // undeclared config keys stay out of the request body.
        assert_eq!(body["prompt"], json!("a cat"));
        assert_eq!(body["style"], json!("vivid"));
        assert!(body.get("api_key").is_none());
    }

    #[test]
    fn data_envelopes_are_unwrapped() {
        assert_eq!(
            unwrap_data_envelope(json!({ "data": { "answer": 42 } })),
            json!({ "answer": 42 })
        );
        assert_eq!(
            unwrap_data_envelope(json!({ "answer": 42 })),
            json!({ "answer": 42 })
        );
        assert_eq!(unwrap_data_envelope(json!([1, 2])), json!([1, 2]));
    }
}
