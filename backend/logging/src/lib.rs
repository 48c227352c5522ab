//! Telemetry and structured logging components for Skillet.
//!
//! Handles log redaction, JSON output generation, file rotation, and specialized execution trace logging.

pub mod execution_logger;
pub mod logger;
pub mod redact;

pub use execution_logger::{ExecutionEvent, ExecutionLogEntry, ExecutionLogger};
pub use logger::init_logger;
pub use redact::{redact_config_json, redact_sensitive_data};
