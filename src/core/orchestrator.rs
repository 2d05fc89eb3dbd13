// src/core/orchestrator.rs

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, instrument, warn};

use crate::config::DispatcherConfig;
use crate::core::client::TaskClient;
use crate::core::error::TaskError;
use crate::core::lifecycle::Transition;
use crate::core::models::{
    AggregateOutcome, BatchOutcome, OperationOutcome, OperationRequest, OutcomeRecord, TaskPayload,
};
use crate::core::store::RecordStore;

/// Timing knobs of the poll loop, lifted out of [`DispatcherConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub budget: Duration,
}

/// Drives operations through a [`TaskClient`] and records every attempt in a
/// [`RecordStore`].
///
/// Per operation: submit, then poll every `interval` until the task reports a
/// terminal state or `budget` runs out. Failures are contained in the
/// operation's record and never abort the rest of the batch.
pub struct Orchestrator<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    policy: PollPolicy,
    ping_timeout_secs: u64,
    default_ports: String,
    max_concurrent_operations: usize,
}

impl<C: TaskClient, S: RecordStore> Orchestrator<C, S> {
    pub fn new(client: Arc<C>, store: Arc<S>, config: &DispatcherConfig) -> Self {
        Self {
            client,
            store,
            policy: PollPolicy { interval: config.poll_interval, budget: config.operation_budget },
            ping_timeout_secs: config.ping_timeout_secs,
            default_ports: config.default_ports.clone(),
            max_concurrent_operations: config.max_concurrent_operations.max(1),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Runs every request of one submission and tallies the result.
    ///
    /// Outcomes come back in request order. With a concurrency limit above 1
    /// several poll loops run at once; the tally is only computed after all of
    /// them have finished.
    #[instrument(skip(self, requests), fields(operations = requests.len()))]
    pub async fn run_batch(&self, user: &str, requests: Vec<OperationRequest>) -> BatchOutcome {
        let target = requests.first().map(|r| r.target.clone()).unwrap_or_default();
        info!(%target, "Starting batch.");

        let outcomes: Vec<OperationOutcome> = stream::iter(requests)
            .map(|request| async move { self.run_operation(user, &request).await })
            .buffered(self.max_concurrent_operations)
            .collect()
            .await;

        let aggregate = AggregateOutcome::from_outcomes(&outcomes);
        info!(
            %target,
            succeeded = aggregate.succeeded_count,
            failed = aggregate.failed_count,
            "Batch finished."
        );
        BatchOutcome { target, outcomes, aggregate }
    }

    /// Runs one request end to end and returns its terminal record.
    #[instrument(skip(self, request), fields(operation = %request.operation, target = %request.target))]
    pub async fn run_operation(&self, user: &str, request: &OperationRequest) -> OperationOutcome {
        let mut record = OutcomeRecord::pending(user, request.target.clone(), request.operation);
        self.persist(&record).await;

        let error = match self.drive(&mut record, request).await {
            Ok(()) => None,
            Err(e) => {
                warn!(record = %record.id, error = %e, "Operation failed.");
                // A remote FAILURE already ended the record inside `apply_poll`.
                if !record.is_terminal() {
                    if let Err(lifecycle) = record.fail(&e) {
                        error!(record = %record.id, error = %lifecycle, "Could not mark record as failed.");
                    }
                }
                Some(e)
            }
        };

        self.persist(&record).await;
        info!(record = %record.id, status = %record.status, success = record.success, "Operation finished.");
        OperationOutcome { record, error }
    }

    // Submit, then poll. Any error returned here turns the record into `failed`.
    async fn drive(&self, record: &mut OutcomeRecord, request: &OperationRequest) -> Result<(), TaskError> {
        let payload = TaskPayload::for_request(request, self.ping_timeout_secs, &self.default_ports);
        let handle = self.client.submit(request.operation, &payload).await?;

        record.begin(&handle).map_err(|e| TaskError::Submission(e.to_string()))?;
        self.persist(record).await;

        let deadline = Instant::now() + self.policy.budget;
        let mut attempts = 0u32;
        while Instant::now() < deadline {
            let poll = self.client.poll(&handle).await?;
            attempts += 1;

            match record.apply_poll(&poll).map_err(|e| TaskError::Poll(e.to_string()))? {
                Transition::Continue => {
                    debug!(task_id = handle.id(), attempts, "Task still running.");
                    sleep(self.policy.interval).await;
                }
                Transition::Terminal(None) => return Ok(()),
                Transition::Terminal(Some(e)) => return Err(e),
            }
        }

        debug!(task_id = handle.id(), attempts, "Poll budget exhausted.");
        Err(TaskError::Timeout)
    }

    // Store trouble is logged and otherwise ignored: the caller still gets
    // the record.
    async fn persist(&self, record: &OutcomeRecord) {
        if let Err(e) = self.store.save(record).await {
            error!(record = %record.id, status = %record.status, error = %e, "Failed to persist record.");
        }
    }
}
