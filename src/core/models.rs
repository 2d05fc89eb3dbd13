// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::core::error::TaskError;

// --- Operations ---

/// A diagnostic action that the remote task API can perform against a target.
///
/// The string form (`ping`, `port_scan`, ...) is what users type on the command
/// line and what gets stored in the history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Ping,
    PortScan,
    DnsLookup,
    HttpHeaders,
}

/// One validated unit of work: a single operation against a single target.
///
/// `target` never carries a scheme or a path, and `ports`, when present, is a
/// comma-separated list where every entry is within 1..=65535.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub target: String,
    pub operation: Operation,
    pub ports: Option<String>,
}

// --- Remote task contract ---

/// Body sent to the remote API when submitting an operation.
///
/// The shape per operation is fixed; `untagged` keeps the wire format flat,
/// e.g. `{"target": "example.com", "timeout": 4}` for a ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Ping { target: String, timeout: u64 },
    PortScan { target: String, ports: String },
    DnsLookup { domain: String },
    HttpHeaders { url: String },
}

impl TaskPayload {
    /// Builds the payload for a request.
    ///
    /// # Arguments
    /// * `request` - The validated request.
    /// * `ping_timeout_secs` - Value of the `timeout` field for ping payloads.
    /// * `default_ports` - Used when a port scan request carries no port list.
    pub fn for_request(request: &OperationRequest, ping_timeout_secs: u64, default_ports: &str) -> Self {
        let target = request.target.clone();
        match request.operation {
            Operation::Ping => TaskPayload::Ping { target, timeout: ping_timeout_secs },
            Operation::PortScan => TaskPayload::PortScan {
                target,
                ports: request.ports.clone().unwrap_or_else(|| default_ports.to_string()),
            },
            Operation::DnsLookup => TaskPayload::DnsLookup { domain: target },
            Operation::HttpHeaders => {
                let url = if target.starts_with("http://") || target.starts_with("https://") {
                    target
                } else {
                    format!("http://{}", target)
                };
                TaskPayload::HttpHeaders { url }
            }
        }
    }
}

/// Opaque identifier of an in-flight remote task. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    id: String,
}

impl TaskHandle {
    /// Wraps a task id, returning `None` for an empty or blank id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() { None } else { Some(Self { id }) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Remote task state as reported by `GET /task/{id}`.
///
/// Anything other than `SUCCESS` or `FAILURE` (`PENDING`, `STARTED`, `RETRY`,
/// ...) means the task is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Success,
    Failure,
    #[serde(other)]
    Running,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

/// One answer from the poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPoll {
    pub status: TaskState,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskPoll {
    pub fn running() -> Self {
        Self { status: TaskState::Running, result: None, error: None }
    }

    pub fn success(result: Value) -> Self {
        Self { status: TaskState::Success, result: Some(result), error: None }
    }

    pub fn failure(error: Option<String>) -> Self {
        Self { status: TaskState::Failure, result: None, error }
    }
}

// --- Outcome records ---

/// Lifecycle state of an [`OutcomeRecord`].
///
/// This tracks the record, not the diagnostic: a ping that reports an
/// unreachable host still ends in `Success` with `OutcomeRecord::success`
/// set to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl OutcomeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OutcomeStatus::Success | OutcomeStatus::Failed)
    }
}

/// Durable result of one operation.
///
/// Created in `Pending`, moved to `InProgress` once a task id is known, and
/// finished in exactly one of `Success`/`Failed` with `completed_at` set.
/// Transitions live in `core::lifecycle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: Uuid,
    pub user: String,
    pub target: String,
    pub operation: Operation,
    pub task_id: Option<String>,
    pub status: OutcomeStatus,
    pub success: bool,
    pub latency_ms: Option<f64>,
    pub result_data: Option<Value>,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A finished operation together with the error that failed it, if any.
#[derive(Debug)]
pub struct OperationOutcome {
    pub record: OutcomeRecord,
    pub error: Option<TaskError>,
}

impl OperationOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Tally over one batch. Derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateOutcome {
    pub succeeded_count: usize,
    pub failed_count: usize,
}

impl AggregateOutcome {
    pub fn from_outcomes(outcomes: &[OperationOutcome]) -> Self {
        let succeeded_count = outcomes.iter().filter(|o| o.is_ok()).count();
        Self { succeeded_count, failed_count: outcomes.len() - succeeded_count }
    }

    pub fn total(&self) -> usize {
        self.succeeded_count + self.failed_count
    }

    pub fn all_succeeded(&self) -> bool {
        self.total() > 0 && self.failed_count == 0
    }

    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.succeeded_count == 0
    }

    pub fn is_partial(&self) -> bool {
        self.succeeded_count > 0 && self.failed_count > 0
    }
}

/// Everything one user submission produced, in request order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub target: String,
    pub outcomes: Vec<OperationOutcome>,
    pub aggregate: AggregateOutcome,
}

impl BatchOutcome {
    pub fn records(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.outcomes.iter().map(|o| &o.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn request(operation: Operation, ports: Option<&str>) -> OperationRequest {
        OperationRequest { target: "example.com".into(), operation, ports: ports.map(String::from) }
    }

    #[test]
    fn operation_names_are_snake_case() {
        assert_eq!(Operation::from_str("port_scan").unwrap(), Operation::PortScan);
        assert_eq!(Operation::HttpHeaders.to_string(), "http_headers");
        assert!(Operation::from_str("traceroute").is_err());
    }

    #[test]
    fn payload_shapes_match_remote_api() {
        let ping = TaskPayload::for_request(&request(Operation::Ping, None), 4, "80");
        assert_eq!(serde_json::to_value(&ping).unwrap(), json!({"target": "example.com", "timeout": 4}));

        let scan = TaskPayload::for_request(&request(Operation::PortScan, Some("22, 80")), 4, "80");
        assert_eq!(serde_json::to_value(&scan).unwrap(), json!({"target": "example.com", "ports": "22, 80"}));

        let dns = TaskPayload::for_request(&request(Operation::DnsLookup, None), 4, "80");
        assert_eq!(serde_json::to_value(&dns).unwrap(), json!({"domain": "example.com"}));

        let headers = TaskPayload::for_request(&request(Operation::HttpHeaders, None), 4, "80");
        assert_eq!(serde_json::to_value(&headers).unwrap(), json!({"url": "http://example.com"}));
    }

    #[test]
    fn port_scan_without_ports_uses_default() {
        let scan = TaskPayload::for_request(&request(Operation::PortScan, None), 4, "80,443");
        assert_eq!(scan, TaskPayload::PortScan { target: "example.com".into(), ports: "80,443".into() });
    }

    #[test]
    fn blank_task_handle_is_rejected() {
        assert!(TaskHandle::new("").is_none());
        assert!(TaskHandle::new("   ").is_none());
        assert_eq!(TaskHandle::new("abc").unwrap().id(), "abc");
    }

    #[test]
    fn unknown_task_states_count_as_running() {
        let poll: TaskPoll = serde_json::from_value(json!({"status": "STARTED"})).unwrap();
        assert_eq!(poll.status, TaskState::Running);
        assert!(!poll.status.is_terminal());

        let poll: TaskPoll =
            serde_json::from_value(json!({"status": "SUCCESS", "result": {"success": true}})).unwrap();
        assert_eq!(poll.status, TaskState::Success);
        assert_eq!(poll.result, Some(json!({"success": true})));
    }

    #[test]
    fn aggregate_classifies_batches() {
        let all = AggregateOutcome { succeeded_count: 2, failed_count: 0 };
        assert!(all.all_succeeded() && !all.is_partial() && !all.all_failed());

        let partial = AggregateOutcome { succeeded_count: 1, failed_count: 1 };
        assert!(partial.is_partial());
        assert_eq!(partial.total(), 2);

        let none = AggregateOutcome { succeeded_count: 0, failed_count: 3 };
        assert!(none.all_failed() && !none.all_succeeded());
    }
}
