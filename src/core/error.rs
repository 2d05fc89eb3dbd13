// src/core/error.rs

use thiserror::Error;
use uuid::Uuid;

use crate::core::models::OutcomeStatus;

/// Rejected user input. Raised before any record exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter target.")]
    EmptyInput,
    #[error("Enter valid port numbers separated by commas (1-65535), got '{0}'.")]
    InvalidPort(String),
    #[error("Select at least one operation.")]
    NoOperations,
    #[error("Unknown operation '{0}'.")]
    UnknownOperation(String),
}

/// Why a single operation ended in `failed`.
///
/// The display text is what ends up in `OutcomeRecord::error_message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Submission failed: {0}")]
    Submission(String),
    #[error("Polling failed: {0}")]
    Poll(String),
    #[error("Timeout waiting for result")]
    Timeout,
    #[error("{0}")]
    RemoteFailure(String),
}

/// Attempt to move a record that already reached `success` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("record is already terminal ({0})")]
    Terminal(OutcomeStatus),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history entry could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("record {0} is terminal and cannot be overwritten")]
    TerminalRecord(Uuid),
}
