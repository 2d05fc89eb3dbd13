// src/core/lifecycle.rs

//! State transitions of an [`OutcomeRecord`].
//!
//! Nothing in here touches the network or the record store: each transition
//! takes the current record plus whatever the task client returned and moves
//! the record forward. The orchestrator decides when to persist.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{LifecycleError, TaskError};
use crate::core::models::{Operation, OutcomeRecord, OutcomeStatus, TaskHandle, TaskPoll, TaskState};

/// Message used when the remote side reports FAILURE without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Remote task failed";

/// What the poll loop should do after a poll result was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Task still running, poll again.
    Continue,
    /// Record reached a terminal state. Carries the error for `failed`.
    Terminal(Option<TaskError>),
}

impl OutcomeRecord {
    /// A fresh record in `pending`.
    pub fn pending(user: impl Into<String>, target: impl Into<String>, operation: Operation) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            target: target.into(),
            operation,
            task_id: None,
            status: OutcomeStatus::Pending,
            success: false,
            latency_ms: None,
            result_data: None,
            error_message: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_open(&self) -> Result<(), LifecycleError> {
        if self.is_terminal() { Err(LifecycleError::Terminal(self.status)) } else { Ok(()) }
    }

    /// `pending -> in_progress` once the remote API handed out a task id.
    pub fn begin(&mut self, handle: &TaskHandle) -> Result<(), LifecycleError> {
        self.ensure_open()?;
        self.task_id = Some(handle.id().to_string());
        self.status = OutcomeStatus::InProgress;
        Ok(())
    }

    /// Folds one poll answer into the record.
    ///
    /// `SUCCESS` copies the remote result (and latency for pings) and ends in
    /// `success`; `FAILURE` ends in `failed`; anything else leaves the record
    /// untouched.
    pub fn apply_poll(&mut self, poll: &TaskPoll) -> Result<Transition, LifecycleError> {
        self.ensure_open()?;
        match poll.status {
            TaskState::Running => Ok(Transition::Continue),
            TaskState::Success => {
                let result = poll.result.as_ref();
                self.success = result.and_then(|r| r.get("success")).and_then(Value::as_bool).unwrap_or(false);
                if self.operation == Operation::Ping {
                    self.latency_ms = result.and_then(|r| r.get("latency_ms")).and_then(Value::as_f64);
                }
                self.error_message = result
                    .and_then(|r| r.get("error"))
                    .and_then(Value::as_str)
                    .map(String::from)
                    .or_else(|| poll.error.clone())
                    .unwrap_or_default();
                self.result_data = poll.result.clone();
                self.finish(OutcomeStatus::Success);
                Ok(Transition::Terminal(None))
            }
            TaskState::Failure => {
                let message = poll
                    .error
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                let error = TaskError::RemoteFailure(message);
                self.fail(&error)?;
                Ok(Transition::Terminal(Some(error)))
            }
        }
    }

    /// Ends the record in `failed` with the error's description.
    pub fn fail(&mut self, error: &TaskError) -> Result<(), LifecycleError> {
        self.ensure_open()?;
        self.success = false;
        self.error_message = error.to_string();
        self.finish(OutcomeStatus::Failed);
        Ok(())
    }

    fn finish(&mut self, status: OutcomeStatus) {
        debug!(record = %self.id, %status, "Record reached terminal state.");
        self.status = status;
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn started(operation: Operation) -> OutcomeRecord {
        let mut record = OutcomeRecord::pending("alice", "example.com", operation);
        record.begin(&TaskHandle::new("t-1").unwrap()).unwrap();
        record
    }

    #[test]
    fn pending_record_starts_clean() {
        let record = OutcomeRecord::pending("alice", "example.com", Operation::Ping);
        assert_eq!(record.status, OutcomeStatus::Pending);
        assert!(!record.success);
        assert!(record.task_id.is_none() && record.completed_at.is_none());
    }

    #[test]
    fn begin_records_task_id() {
        let record = started(Operation::Ping);
        assert_eq!(record.status, OutcomeStatus::InProgress);
        assert_eq!(record.task_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn running_poll_changes_nothing() {
        let mut record = started(Operation::Ping);
        let before = record.clone();
        assert_eq!(record.apply_poll(&TaskPoll::running()).unwrap(), Transition::Continue);
        assert_eq!(record, before);
    }

    #[test]
    fn ping_success_copies_latency_and_result() {
        let mut record = started(Operation::Ping);
        let result = json!({"success": true, "latency_ms": 12.5});
        let transition = record.apply_poll(&TaskPoll::success(result.clone())).unwrap();

        assert_eq!(transition, Transition::Terminal(None));
        assert_eq!(record.status, OutcomeStatus::Success);
        assert!(record.success);
        assert_eq!(record.latency_ms, Some(12.5));
        assert_eq!(record.result_data, Some(result));
        assert_eq!(record.error_message, "");
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn unreachable_host_is_lifecycle_success_with_false_flag() {
        let mut record = started(Operation::Ping);
        record
            .apply_poll(&TaskPoll::success(json!({"success": false, "error": "Host unreachable"})))
            .unwrap();

        assert_eq!(record.status, OutcomeStatus::Success);
        assert!(!record.success);
        assert_eq!(record.error_message, "Host unreachable");
    }

    #[test]
    fn latency_is_ignored_for_other_operations() {
        let mut record = started(Operation::DnsLookup);
        record.apply_poll(&TaskPoll::success(json!({"success": true, "latency_ms": 3.0}))).unwrap();
        assert_eq!(record.latency_ms, None);
    }

    #[test]
    fn failure_uses_remote_error_or_default() {
        let mut record = started(Operation::PortScan);
        let transition = record.apply_poll(&TaskPoll::failure(Some("nmap crashed".into()))).unwrap();
        assert_eq!(transition, Transition::Terminal(Some(TaskError::RemoteFailure("nmap crashed".into()))));
        assert_eq!(record.status, OutcomeStatus::Failed);
        assert_eq!(record.error_message, "nmap crashed");

        let mut record = started(Operation::PortScan);
        record.apply_poll(&TaskPoll::failure(None)).unwrap();
        assert_eq!(record.error_message, DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn timeout_message_is_fixed() {
        let mut record = started(Operation::HttpHeaders);
        record.fail(&TaskError::Timeout).unwrap();
        assert_eq!(record.status, OutcomeStatus::Failed);
        assert_eq!(record.error_message, "Timeout waiting for result");
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn terminal_records_never_change() {
        let mut record = started(Operation::Ping);
        record.apply_poll(&TaskPoll::success(json!({"success": true, "latency_ms": 1.0}))).unwrap();
        let frozen = record.clone();

        assert_eq!(
            record.apply_poll(&TaskPoll::failure(Some("late".into()))),
            Err(LifecycleError::Terminal(OutcomeStatus::Success))
        );
        assert!(record.fail(&TaskError::Timeout).is_err());
        assert!(record.begin(&TaskHandle::new("t-2").unwrap()).is_err());
        assert_eq!(record, frozen);
    }

    #[test]
    fn pending_record_can_fail_directly() {
        let mut record = OutcomeRecord::pending("alice", "example.com", Operation::Ping);
        record.fail(&TaskError::Submission("connection refused".into())).unwrap();
        assert_eq!(record.status, OutcomeStatus::Failed);
        assert!(record.task_id.is_none());
        assert_eq!(record.error_message, "Submission failed: connection refused");
    }
}
