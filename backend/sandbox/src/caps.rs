//! Host API installed into the sandbox.
//!
//! Plugin source sees a small, fixed set of globals: `parameters` and
//! `config` (plain data), `console`, `fetch`, `sleep`, `now`, and, only
//! when the caller's config carries credentials, `model`. Native functions
//! return JSON strings and a JS prelude turns them into ergonomic wrappers,
//! so failures surface inside the script as ordinary thrown `Error`s.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result};
use rquickjs::function::Func;
use rquickjs::Ctx;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::client::ModelClient;
use crate::host::json_to_js;
use crate::limits::SandboxLimits;

const SSRF_BLOCKED_HOSTS: &[&str] =
    &["localhost", "127.0.0.1", "0.0.0.0", "::1", "169.254.169.254"];

/// What a sandboxed call may see and touch.
#[derive(Debug, Clone)]
pub struct SandboxCapabilities {
    /// Plugin name, used to tag everything the script logs.
    pub plugin_name: String,
    /// Validated call arguments, exposed as the `parameters` global.
    pub parameters: Value,
    /// Resolved per-user config, exposed as the `config` global.
    pub config: Value,
    /// When set, scripts get `model.complete(prompt, options?)`.
    pub model: Option<ModelClient>,
}

impl SandboxCapabilities {
    pub fn new(plugin_name: impl Into<String>, parameters: Value, config: Value) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            parameters,
            config,
            model: None,
        }
    }

    pub fn with_model(mut self, model: ModelClient) -> Self {
        self.model = Some(model);
        self
    }
}

// ---------------------------------------------------------------------------
// Installation
// ---------------------------------------------------------------------------

const HOST_PRELUDE: &str = r#"
globalThis.console = {
    log: (...args) => __host_log("info", args.map(String).join(" ")),
    warn: (...args) => __host_log("warn", args.map(String).join(" ")),
    error: (...args) => __host_log("error", args.map(String).join(" ")),
};
globalThis.fetch = (url, options) => {
    const result = JSON.parse(__host_fetch(String(url), JSON.stringify(options ?? null)));
    if (result.__error) {
        throw new Error(result.__error);
    }
    return result;
};
"#;

const MODEL_PRELUDE: &str = r#"
globalThis.model = {
    complete: (prompt, options) => {
        const result = JSON.parse(__host_model_complete(String(prompt), JSON.stringify(options ?? null)));
        if (result.__error) {
            throw new Error(result.__error);
        }
        return result.text;
    },
};
"#;

/// Registers the native host functions and evaluates the JS prelude.
pub(crate) fn install(
    ctx: &Ctx<'_>,
    caps: &SandboxCapabilities,
    limits: &SandboxLimits,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    globals.set("parameters", json_to_js(ctx, &caps.parameters)?)?;
    globals.set("config", json_to_js(ctx, &caps.config)?)?;

    let plugin = caps.plugin_name.clone();
    globals.set(
        "__host_log",
        Func::from(move |level: String, message: String| match level.as_str() {
            "warn" => warn!(plugin = %plugin, "[Plugin] {message}"),
            "error" => error!(plugin = %plugin, "[Plugin] {message}"),
            _ => info!(plugin = %plugin, "[Plugin] {message}"),
        }),
    )?;

    let fetch_limits = limits.clone();
    globals.set(
        "__host_fetch",
        Func::from(move |url: String, options_json: String| {
            host_result(host_fetch(&fetch_limits, &url, &options_json))
        }),
    )?;

    // A single sleep cannot exceed the whole call budget. The wall-clock
    // interrupt only fires between JS instructions, so native time must be
    // bounded on its own.
    let budget_ms = limits.time_budget.as_millis() as f64;
    globals.set(
        "sleep",
        Func::from(move |ms: f64| {
            let capped = ms.max(0.0).min(budget_ms) as u64;
            std::thread::sleep(Duration::from_millis(capped));
        }),
    )?;

    globals.set(
        "now",
        Func::from(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as f64)
                .unwrap_or(0.0)
        }),
    )?;

    let has_model = caps.model.is_some();
    if let Some(model) = caps.model.clone() {
        globals.set(
            "__host_model_complete",
            Func::from(move |prompt: String, options_json: String| {
                let options = serde_json::from_str::<Value>(&options_json)
                    .ok()
                    .filter(Value::is_object);
                host_result(
                    model
                        .complete(&prompt, options.as_ref())
                        .map(|text| json!({ "text": text })),
                )
            }),
        )?;
    }

    ctx.eval::<(), _>(HOST_PRELUDE)?;
    if has_model {
        ctx.eval::<(), _>(MODEL_PRELUDE)?;
    }
    Ok(())
}

/// Encodes a host call result for the JS wrappers: the payload itself on
/// success, `{"__error": ...}` on failure.
fn host_result(result: Result<Value>) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(err) => json!({ "__error": format!("{err:#}") }).to_string(),
    }
}

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

/// Rejects URLs that point into the host's own network.
/// Blocks SSRF targets (localhost, AWS metadata IP, etc.)
fn check_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw).context("invalid URL")?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("unsupported scheme '{}'", parsed.scheme());
    }
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    if SSRF_BLOCKED_HOSTS.iter().any(|b| host.contains(b)) {
        anyhow::bail!("SSRF: blocked host {}", host);
    }
    Ok(parsed)
}

fn host_fetch(limits: &SandboxLimits, raw_url: &str, options_json: &str) -> Result<Value> {
    check_url(raw_url)?;

    let options: Value = serde_json::from_str(options_json).unwrap_or(Value::Null);
    let method = options
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET")
        .to_uppercase();

    let client = reqwest::blocking::Client::builder()
        .timeout(limits.fetch_timeout)
        .build()
        .context("Failed to build fetch client")?;

    let mut request = match method.as_str() {
        "GET" => client.get(raw_url),
        "POST" => client.post(raw_url),
        "PUT" => client.put(raw_url),
        "PATCH" => client.patch(raw_url),
        "DELETE" => client.delete(raw_url),
        other => anyhow::bail!("unsupported method '{other}'"),
    };

    if let Some(headers) = options.get("headers").and_then(Value::as_object) {
        for (name, value) in headers {
            if let Some(text) = value.as_str() {
                request = request.header(name.as_str(), text);
            }
        }
    }
    if let Some(body) = options.get("body") {
        request = match body {
            Value::String(text) => request.body(text.clone()),
            other => request.json(other),
        };
    }

    debug!(url = %raw_url, method = %method, "[Sandbox] fetch");
    let response = request.send().context("fetch request failed")?;

    let status = response.status().as_u16();
    let ok = response.status().is_success();
    let headers: Map<String, Value> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), Value::String(v.to_string())))
        })
        .collect();

    let bytes = response.bytes().context("failed to read fetch response")?;
    let truncated = bytes.len() > limits.fetch_max_bytes;
    let slice = &bytes[..bytes.len().min(limits.fetch_max_bytes)];
    let body = String::from_utf8_lossy(slice).to_string();
    let body_json = serde_json::from_str::<Value>(&body).ok();

    Ok(json!({
        "status": status,
        "ok": ok,
        "headers": headers,
        "body": body,
        "json": body_json,
        "truncated": truncated,
    }))
}
