//! Progress events streamed while an execution runs.
//!
//! Events travel over a bounded channel so a slow consumer applies
//! backpressure instead of growing an unbounded queue. The engine treats the
//! stream as advisory: a closed or full channel never changes the outcome of
//! the execution it reports on.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Default bound for [`event_channel`]. Large enough that a consumer reading
/// at any reasonable pace never blocks the engine.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Event shapes
// ---------------------------------------------------------------------------

/// Coarse execution phase an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// What kind of event this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillEventKind {
    /// Lifecycle transition (pending, in progress, completed).
    Status,
    /// Free-form progress text from a runtime.
    Message,
    /// Terminal failure notice.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEventData {
    pub status: EventStatus,
    pub description: String,
    /// `true` only on the final event of a stream.
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One event on the progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEvent {
    #[serde(rename = "type")]
    pub kind: SkillEventKind,
    pub data: SkillEventData,
}

impl SkillEvent {
    pub fn status(status: EventStatus, description: impl Into<String>, done: bool) -> Self {
        Self {
            kind: SkillEventKind::Status,
            data: SkillEventData {
                status,
                description: description.into(),
                done,
                error: None,
            },
        }
    }

    /// Mid-run progress text. Always `in_progress` and never final.
    pub fn message(description: impl Into<String>) -> Self {
        Self {
            kind: SkillEventKind::Message,
            data: SkillEventData {
                status: EventStatus::InProgress,
                description: description.into(),
                done: false,
                error: None,
            },
        }
    }

    /// Terminal failure event. Always `failed` and final.
    pub fn error(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            kind: SkillEventKind::Error,
            data: SkillEventData {
                status: EventStatus::Failed,
                description: "Execution failed".to_string(),
                done: true,
                error: Some(error),
            },
        }
    }

    pub fn is_final(&self) -> bool {
        self.data.done
    }
}

// ---------------------------------------------------------------------------
// Channel plumbing
// ---------------------------------------------------------------------------

/// Sending half of a progress stream, carried in
/// [`crate::execution::ExecutionContext`].
pub type EventSink = mpsc::Sender<SkillEvent>;

/// Builds a bounded progress channel. The receiver comes wrapped as a
/// [`ReceiverStream`] so it can be forwarded to SSE or WebSocket responses
/// without extra glue.
pub fn event_channel(capacity: usize) -> (EventSink, ReceiverStream<SkillEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_stream::StreamExt;

    #[test]
    fn constructors_fill_the_expected_fields() {
        let pending = SkillEvent::status(EventStatus::Pending, "Execution queued", false);
        assert_eq!(pending.kind, SkillEventKind::Status);
        assert_eq!(pending.data.status, EventStatus::Pending);
        assert!(!pending.is_final());

        let message = SkillEvent::message("Calling upstream API");
        assert_eq!(message.kind, SkillEventKind::Message);
        assert_eq!(message.data.status, EventStatus::InProgress);
        assert!(!message.data.done);
        assert!(message.data.error.is_none());

        let error = SkillEvent::error("upstream returned 500");
        assert_eq!(error.kind, SkillEventKind::Error);
        assert_eq!(error.data.status, EventStatus::Failed);
        assert!(error.is_final());
        assert_eq!(error.data.error.as_deref(), Some("upstream returned 500"));
    }

    #[test]
    fn wire_format_uses_snake_case_tags() {
        let event = SkillEvent::status(EventStatus::InProgress, "Executing function", false);
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "status",
                "data": {
                    "status": "in_progress",
                    "description": "Executing function",
                    "done": false
                }
            })
        );

        let decoded: SkillEvent = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, event);
    }

    #[tokio::test]
    async fn channel_delivers_events_in_order() {
        let (tx, mut rx) = event_channel(DEFAULT_EVENT_BUFFER);
        tx.send(SkillEvent::status(EventStatus::Pending, "queued", false))
            .await
            .unwrap();
        tx.send(SkillEvent::message("working"))
            .await
            .unwrap();
        tx.send(SkillEvent::status(EventStatus::Completed, "done", true))
            .await
            .unwrap();
        drop(tx);

        let first = rx.next().await.unwrap();
        assert_eq!(first.data.status, EventStatus::Pending);
        let second = rx.next().await.unwrap();
        assert_eq!(second.kind, SkillEventKind::Message);
        let third = rx.next().await.unwrap();
        assert!(third.is_final());
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let (tx, mut rx) = event_channel(0);
        tx.send(SkillEvent::message("still works")).await.unwrap();
        drop(tx);
        assert!(rx.next().await.is_some());
    }
}
