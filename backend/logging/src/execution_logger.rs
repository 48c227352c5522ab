//! Execution Trace Logger
//!
//! Structured lifecycle events (started, completed, failed) written to the
//! rolling NDJSON logs, separate from the persistent execution history the
//! engine keeps in its stores.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    Started {
        plugin_id: String,
        function_name: String,
    },
    Completed {
        plugin_id: String,
        function_name: String,
        duration_ms: u64,
    },
    Failed {
        plugin_id: String,
        function_name: String,
        error: String,
        duration_ms: u64,
    },
}

#[derive(Debug, Serialize)]
pub struct ExecutionLogEntry {
    pub execution_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ExecutionEvent,
}

pub struct ExecutionLogger;

impl ExecutionLogger {
    /// Logs one lifecycle event, scrubbing error text before it reaches the
    /// tracing system. Failure messages can echo upstream responses that
    /// contain credentials.
    pub fn log_event(execution_id: &str, user_id: &str, mut event: ExecutionEvent) {
        if let ExecutionEvent::Failed { error, .. } = &mut event {
            *error = redact_sensitive_data(error);
        }

        let entry = ExecutionLogEntry {
            execution_id: execution_id.into(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            event,
        };

        // Leverage tracing to output NDJSON correctly wrapped
        info!(target: "skill_executions", event = ?entry, "Execution trace event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects whatever the subscriber writes so a test can assert on the
    /// emitted line itself.
    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn failed_event_redacts_the_error_text() {
        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            ExecutionLogger::log_event(
                "e-1",
                "u-1",
                ExecutionEvent::Failed {
                    plugin_id: "weather".into(),
                    function_name: "current".into(),
                    error: "denied for Bearer abc123secret".into(),
                    duration_ms: 12,
                },
            );
        });

        let output = writer.contents();
        assert!(output.contains("Execution trace event"), "unexpected: {output}");
        assert!(!output.contains("abc123secret"), "unexpected: {output}");
        assert!(output.contains("[REDACTED_TOKEN]"), "unexpected: {output}");
    }

    #[test]
    fn entries_serialize_with_a_type_tag() {
        let entry = ExecutionLogEntry {
            execution_id: "e-1".into(),
            user_id: "u-1".into(),
            timestamp: Utc::now(),
            event: ExecutionEvent::Started {
                plugin_id: "weather".into(),
                function_name: "current".into(),
            },
        };
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["event"]["type"], "Started");
        assert_eq!(encoded["event"]["plugin_id"], "weather");
    }
}
