// src/lib.rs

//! Dispatches network diagnostics (ping, port scan, DNS lookup, HTTP header
//! fetch) to a remote task API, polls them to completion and keeps a per-user
//! history of every attempt.

pub mod config;
pub mod core;
pub mod logging;
pub mod report;

pub use crate::config::DispatcherConfig;
pub use crate::core::client::{HttpTaskClient, TaskClient};
pub use crate::core::models::{BatchOutcome, Operation, OperationRequest, OutcomeRecord, OutcomeStatus};
pub use crate::core::orchestrator::Orchestrator;
pub use crate::core::store::{JsonlRecordStore, MemoryRecordStore, RecordStore};
