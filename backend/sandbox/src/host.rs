//! QuickJS host: evaluates plugin source and invokes one function per call.
//!
//! Every call gets a fresh runtime and context. Nothing survives between
//! executions, so scripts cannot stash state or observe other users' calls,
//! and a crashed heap is simply thrown away.
//!
//! The target must be reachable as a property of the global object. Function
//! declarations and `var` bindings qualify; `const`/`let` bindings stay
//! lexical and are invisible to the host. `async function` targets work too:
//! the returned promise is driven to settlement before the result converts
//! back to JSON.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rquickjs::{Context, Ctx, Runtime, Value as JsValue};
use serde_json::Value;
use tracing::debug;

use crate::caps::{self, SandboxCapabilities};
use crate::error::SandboxError;
use crate::limits::SandboxLimits;

/// Runs `function_name` from `source` with the capability set and limits
/// given. Blocking; callers on an async runtime should wrap this in
/// `spawn_blocking`.
pub fn run_function(
    source: &str,
    function_name: &str,
    caps: &SandboxCapabilities,
    limits: &SandboxLimits,
) -> Result<Value, SandboxError> {
    debug!(
        plugin = %caps.plugin_name,
        function = %function_name,
        "[Sandbox] starting call"
    );

    let runtime = Runtime::new().map_err(|e| SandboxError::Eval(e.to_string()))?;
    runtime.set_memory_limit(limits.memory_bytes);
    runtime.set_max_stack_size(limits.stack_bytes);

    let interrupted = Arc::new(AtomicBool::new(false));
    let deadline = Instant::now() + limits.time_budget;
    {
        let interrupted = interrupted.clone();
        runtime.set_interrupt_handler(Some(Box::new(move || {
            if Instant::now() >= deadline {
                interrupted.store(true, Ordering::Relaxed);
                true
            } else {
                false
            }
        })));
    }

    let context = Context::full(&runtime).map_err(|e| SandboxError::Eval(e.to_string()))?;
    let result = context.with(|ctx| evaluate_and_call(&ctx, source, function_name, caps, limits));

    if interrupted.load(Ordering::Relaxed) {
        return Err(SandboxError::TimedOut(limits.time_budget.as_millis() as u64));
    }
    result
}

fn evaluate_and_call(
    ctx: &Ctx<'_>,
    source: &str,
    function_name: &str,
    caps: &SandboxCapabilities,
    limits: &SandboxLimits,
) -> Result<Value, SandboxError> {
    caps::install(ctx, caps, limits).map_err(|err| map_js_error(ctx, err))?;

    ctx.eval::<(), _>(source)
        .map_err(|err| map_js_error(ctx, err))?;

    let target: JsValue = ctx
        .globals()
        .get(function_name)
        .map_err(|err| map_js_error(ctx, err))?;
    if target.is_undefined() || target.is_null() {
        return Err(SandboxError::FunctionMissing(function_name.to_string()));
    }
    let function = target
        .into_function()
        .ok_or_else(|| SandboxError::NotAFunction(function_name.to_string()))?;

    let params = json_to_js(ctx, &caps.parameters).map_err(|err| map_js_error(ctx, err))?;
    let result: JsValue = function
        .call((params,))
        .map_err(|err| map_js_error(ctx, err))?;
    let result = settle(ctx, result)?;

    js_to_json(ctx, result)
}

/// An `async function` target hands back a promise, not its value. Run the
/// job queue until the promise settles and return what it settled to; a
/// rejection surfaces like a thrown error. A promise that cannot settle
/// (nothing in the sandbox resolves it) is an error rather than a silent `{}`.
fn settle<'js>(ctx: &Ctx<'js>, value: JsValue<'js>) -> Result<JsValue<'js>, SandboxError> {
    match value.as_promise() {
        Some(promise) => match promise.finish::<JsValue>() {
            Ok(resolved) => Ok(resolved),
            Err(rquickjs::Error::WouldBlock) => Err(SandboxError::StalledPromise),
            Err(err) => Err(map_js_error(ctx, err)),
        },
        None => Ok(value),
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Builds a JS value from JSON by parsing its serialized form inside the
/// engine; the engine's own JSON parser handles nesting and escaping.
pub(crate) fn json_to_js<'js>(ctx: &Ctx<'js>, value: &Value) -> rquickjs::Result<JsValue<'js>> {
    ctx.json_parse(value.to_string())
}

/// Converts a script result back to JSON. `undefined` (a function with no
/// return value, or a non-serializable result) becomes `null`.
fn js_to_json<'js>(ctx: &Ctx<'js>, value: JsValue<'js>) -> Result<Value, SandboxError> {
    match ctx.json_stringify(value) {
        Ok(Some(text)) => {
            let raw = text
                .to_string()
                .map_err(|e| SandboxError::Convert(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| SandboxError::Convert(e.to_string()))
        }
        Ok(None) => Ok(Value::Null),
        Err(err) => Err(SandboxError::Convert(err.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_js_error(ctx: &Ctx<'_>, err: rquickjs::Error) -> SandboxError {
    if matches!(err, rquickjs::Error::Exception) {
        SandboxError::Exception(exception_text(ctx))
    } else {
        SandboxError::Eval(err.to_string())
    }
}

fn exception_text(ctx: &Ctx<'_>) -> String {
    let caught = ctx.catch();
    if let Some(exception) = caught.as_exception() {
        if let Some(message) = exception.message() {
            return message;
        }
    }
    if let Some(text) = caught.as_string().and_then(|s| s.to_string().ok()) {
        return text;
    }
    match ctx.json_stringify(caught) {
        Ok(Some(raw)) => raw
            .to_string()
            .unwrap_or_else(|_| "unknown script error".to_string()),
        _ => "unknown script error".to_string(),
    }
}
