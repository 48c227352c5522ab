//! Sandbox error type.

use thiserror::Error;

/// Ways a sandboxed call can fail. `Exception` carries whatever the script
/// threw; everything else is a host-side problem.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("script evaluation failed: {0}")]
    Eval(String),

    #[error("function '{0}' is not defined in the plugin source")]
    FunctionMissing(String),

    #[error("'{0}' is not a function")]
    NotAFunction(String),

    #[error("script threw: {0}")]
    Exception(String),

    #[error("execution exceeded the time budget of {0} ms")]
    TimedOut(u64),

    #[error("function returned a promise that never settles")]
    StalledPromise,

    #[error("could not convert script result: {0}")]
    Convert(String),
}
