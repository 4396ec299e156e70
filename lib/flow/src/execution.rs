//! Execution log records.
//!
//! One [`ExecutionLog`] is written per flow run. It is created as soon as the
//! run starts, updated as each node is visited, and finalized exactly once to
//! `completed` or `failed`. The engine never deletes logs.

use crate::node::NodeId;
use chrono::{DateTime, Utc};
use crosswire_core::{ExecutionLogId, FlowId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Retry allowance recorded on new logs. Retries are bookkeeping only; no
/// automatic retry runs today.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Status of a flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Recorded but not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped before finishing.
    Cancelled,
}

impl ExecutionStatus {
    /// Returns the snake_case name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the run has reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable record of one flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Unique identifier for this record.
    pub id: ExecutionLogId,
    /// The flow that ran.
    pub flow_id: FlowId,
    /// The flow's owner.
    pub user_id: UserId,
    /// The type of the event that triggered the run ("comment", "manual", ...).
    pub trigger_type: String,
    /// The triggering event, serialized.
    pub trigger_data: JsonValue,
    /// Node ids in visit order.
    pub execution_path: Vec<NodeId>,
    /// Current status.
    pub status: ExecutionStatus,
    /// The final handler's result, present on completed runs.
    pub result: Option<JsonValue>,
    /// The failure message, present on failed runs.
    pub error: Option<String>,
    /// Wall-clock run duration in milliseconds, set on finalize.
    pub execution_time_ms: Option<u64>,
    /// Retries performed so far.
    pub retry_count: u32,
    /// Retries allowed.
    pub max_retries: u32,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionLog {
    /// Creates the record for a run that is starting now.
    #[must_use]
    pub fn start(
        flow_id: FlowId,
        user_id: UserId,
        trigger_type: impl Into<String>,
        trigger_data: JsonValue,
    ) -> Self {
        Self {
            id: ExecutionLogId::new(),
            flow_id,
            user_id,
            trigger_type: trigger_type.into(),
            trigger_data,
            execution_path: Vec::new(),
            status: ExecutionStatus::Running,
            result: None,
            error: None,
            execution_time_ms: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Appends a node to the visit path.
    pub fn visit_node(&mut self, node_id: NodeId) {
        self.execution_path.push(node_id);
    }

    /// Finalizes the run as completed.
    pub fn complete(&mut self, result: JsonValue, elapsed_ms: u64) {
        self.status = ExecutionStatus::Completed;
        self.result = Some(result);
        self.execution_time_ms = Some(elapsed_ms);
        self.finished_at = Some(Utc::now());
    }

    /// Finalizes the run as failed.
    pub fn fail(&mut self, error: impl Into<String>, elapsed_ms: u64) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.execution_time_ms = Some(elapsed_ms);
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_log() -> ExecutionLog {
        ExecutionLog::start(
            FlowId::new(),
            UserId::new(),
            "comment",
            json!({"platform": "instagram"}),
        )
    }

    #[test]
    fn starts_running_with_empty_path() {
        let log = new_log();
        assert_eq!(log.status, ExecutionStatus::Running);
        assert!(log.execution_path.is_empty());
        assert!(log.finished_at.is_none());
        assert_eq!(log.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(log.retry_count, 0);
    }

    #[test]
    fn visit_order_is_preserved() {
        let mut log = new_log();
        log.visit_node(NodeId::from("a"));
        log.visit_node(NodeId::from("b"));
        assert_eq!(
            log.execution_path,
            vec![NodeId::from("a"), NodeId::from("b")]
        );
    }

    #[test]
    fn complete_sets_terminal_fields() {
        let mut log = new_log();
        log.complete(json!({"sent": true}), 1250);

        assert_eq!(log.status, ExecutionStatus::Completed);
        assert!(log.status.is_terminal());
        assert_eq!(log.result, Some(json!({"sent": true})));
        assert_eq!(log.execution_time_ms, Some(1250));
        assert!(log.error.is_none());
        assert!(log.finished_at.is_some());
    }

    #[test]
    fn fail_captures_message() {
        let mut log = new_log();
        log.fail("no trigger node found", 3);

        assert_eq!(log.status, ExecutionStatus::Failed);
        assert_eq!(log.error.as_deref(), Some("no trigger node found"));
        assert_eq!(log.execution_time_ms, Some(3));
        assert!(log.result.is_none());
    }

    #[test]
    fn status_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Completed).expect("serialize"),
            "\"completed\""
        );
        let parsed: ExecutionStatus =
            serde_json::from_str("\"cancelled\"").expect("deserialize");
        assert_eq!(parsed, ExecutionStatus::Cancelled);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Cancelled.is_terminal());
    }
}
