//! Execution records, call context, and outcomes.
//!
//! Every function call produces a [`SkillExecution`] record that moves
//! through a small state machine: it is created `Pending`, becomes `Running`
//! once dispatch starts, and ends `Completed` or `Failed`. Records are
//! persisted through [`crate::traits::ExecutionLogStore`] so the app can
//! show users a history of what their plugins did.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::event::EventSink;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of an execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Reserved for user-initiated cancellation; no code path sets it yet.
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

// ---------------------------------------------------------------------------
// Execution record
// ---------------------------------------------------------------------------

/// Persistent record of one function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillExecution {
    pub id: Uuid,
    pub plugin_id: String,
    pub function_name: String,
    /// Arguments as received, before defaults are applied.
    pub parameters: Map<String, Value>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub execution_time_ms: Option<u64>,
}

impl SkillExecution {
    /// Creates a fresh `Pending` record for a call that is about to run.
    pub fn new(plugin_id: &str, function_name: &str, parameters: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            plugin_id: plugin_id.to_string(),
            function_name: function_name.to_string(),
            parameters,
            output: None,
            error: None,
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            execution_time_ms: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = ExecutionStatus::Running;
    }

    pub fn complete(&mut self, output: Value, elapsed_ms: u64) {
        self.status = ExecutionStatus::Completed;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
        self.execution_time_ms = Some(elapsed_ms);
    }

    pub fn fail(&mut self, error: impl Into<String>, elapsed_ms: u64) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        self.execution_time_ms = Some(elapsed_ms);
    }
}

// ---------------------------------------------------------------------------
// Call context
// ---------------------------------------------------------------------------

/// Who is calling and where progress events should go.
///
/// The engine resolves configuration for `user_id`; `assistant_id` and
/// `conversation_id` only travel along for logging and storage. When
/// `event_sink` is set the engine streams [`crate::event::SkillEvent`]s into
/// it for the duration of the call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub user_id: String,
    pub assistant_id: Option<String>,
    pub conversation_id: Option<String>,
    pub event_sink: Option<EventSink>,
}

impl ExecutionContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            assistant_id: None,
            conversation_id: None,
            event_sink: None,
        }
    }

    pub fn with_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What the caller gets back. Failures are data, not `Err`: the engine
/// reports every problem through this shape so callers have one code path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub metadata: ExecutionMetadata,
}

/// Identifies which call an outcome belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    pub plugin_id: String,
    pub function_name: String,
    pub execution_id: Uuid,
}

impl ExecutionOutcome {
    pub fn success(data: Value, elapsed_ms: u64, metadata: ExecutionMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms: elapsed_ms,
            metadata,
        }
    }

    pub fn failure(error: impl Into<String>, elapsed_ms: u64, metadata: ExecutionMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms: elapsed_ms,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_args() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("city".into(), json!("Oslo"));
        map
    }

    #[test]
    fn new_record_starts_pending() {
        let record = SkillExecution::new("weather", "current", sample_args());
        assert_eq!(record.status, ExecutionStatus::Pending);
        assert!(record.output.is_none());
        assert!(record.error.is_none());
        assert!(record.completed_at.is_none());
        assert!(record.execution_time_ms.is_none());
    }

    #[test]
    fn complete_stamps_output_and_timing() {
        let mut record = SkillExecution::new("weather", "current", sample_args());
        record.mark_running();
        assert_eq!(record.status, ExecutionStatus::Running);

        record.complete(json!({ "temp": 21 }), 123);
        assert_eq!(record.status, ExecutionStatus::Completed);
        assert_eq!(record.output, Some(json!({ "temp": 21 })));
        assert!(record.completed_at.is_some());
        assert_eq!(record.execution_time_ms, Some(123));
        assert!(record.status.is_terminal());
    }

    #[test]
    fn fail_keeps_the_error_message() {
        let mut record = SkillExecution::new("weather", "current", sample_args());
        record.mark_running();
        record.fail("upstream returned 500", 45);
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("upstream returned 500"));
        assert!(record.output.is_none());
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn context_builders_compose() {
        let ctx = ExecutionContext::for_user("user-1")
            .with_assistant("asst-7")
            .with_conversation("conv-9");
        assert_eq!(ctx.user_id, "user-1");
        assert_eq!(ctx.assistant_id.as_deref(), Some("asst-7"));
        assert_eq!(ctx.conversation_id.as_deref(), Some("conv-9"));
        assert!(ctx.event_sink.is_none());
    }

    #[test]
    fn outcome_constructors_set_the_success_flag() {
        let metadata = ExecutionMetadata {
            plugin_id: "weather".into(),
            function_name: "current".into(),
            execution_id: Uuid::new_v4(),
        };

        let ok = ExecutionOutcome::success(json!({ "temp": 21 }), 10, metadata.clone());
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = ExecutionOutcome::failure("boom", 10, metadata);
        assert!(!failed.success);
        assert!(failed.data.is_none());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
