//! Engine error type.

use thiserror::Error;

use crate::validate::Violation;

/// Everything that can stop an execution before or while it runs.
///
/// The engine converts these into failed outcomes rather than surfacing
/// `Err` to callers; the variants exist so runtimes and stores can signal
/// precisely what went wrong and tests can assert on it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parameter validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    #[error("plugin '{0}' not found")]
    PluginNotFound(String),

    #[error("plugin '{0}' is inactive")]
    PluginInactive(String),

    #[error("function '{function}' not found in plugin '{plugin}'")]
    FunctionNotFound { plugin: String, function: String },

    #[error("unsupported runtime kind '{0}'")]
    UnsupportedRuntime(String),

    #[error("webhook execution is not implemented")]
    WebhookNotImplemented,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("runtime execution failed: {0}")]
    Runtime(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
