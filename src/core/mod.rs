// src/core/mod.rs

// The `core` module holds everything except presentation: the data model,
// input validation, the remote task client, the record store and the
// orchestrator that ties them together.

/// Data structures shared by every other module: operations, payloads,
/// task handles, outcome records and batch tallies.
pub mod models;

/// Error types for validation, remote tasks, record transitions and storage.
pub mod error;

/// Normalization and range checks for targets, ports and operation names.
pub mod validator;

/// Static description of each operation and the endpoint that runs it.
pub mod catalog;

/// The `TaskClient` seam and its HTTP implementation.
pub mod client;

/// Pure state transitions of an outcome record.
pub mod lifecycle;

/// Durable per-user history of outcome records.
pub mod store;

/// Submit-and-poll driver for single operations and whole batches.
pub mod orchestrator;
