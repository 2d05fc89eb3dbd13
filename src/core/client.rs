// src/core/client.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::DispatcherConfig;
use crate::core::catalog;
use crate::core::error::TaskError;
use crate::core::models::{Operation, TaskHandle, TaskPayload, TaskPoll};

/// The two calls the remote task API offers.
///
/// Each call is exactly one outbound request. Retrying, pacing and the overall
/// budget are the orchestrator's job.
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Starts `operation` remotely and returns the id of the new task.
    async fn submit(&self, operation: Operation, payload: &TaskPayload) -> Result<TaskHandle, TaskError>;

    /// Asks for the current state of a task.
    async fn poll(&self, handle: &TaskHandle) -> Result<TaskPoll, TaskError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<serde_json::Value>,
}

/// [`TaskClient`] talking JSON over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    http: Client,
    base_url: Url,
    submit_timeout: std::time::Duration,
    poll_timeout: std::time::Duration,
}

impl HttpTaskClient {
    pub fn new(config: &DispatcherConfig) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("VanguardRS-Dispatcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .inspect_err(|e| error!(error = %e, "Failed to build HTTP client for the task API."))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            submit_timeout: config.submit_timeout,
            poll_timeout: config.poll_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base_url.join(path).map_err(|e| format!("invalid endpoint '{}': {}", path, e))
    }

    /// `{base}/task/{id}` with the id pushed as one escaped path segment.
    fn task_url(&self, handle: &TaskHandle) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .push("task")
            .push(handle.id());
        Ok(url)
    }
}

#[async_trait]
impl TaskClient for HttpTaskClient {
    async fn submit(&self, operation: Operation, payload: &TaskPayload) -> Result<TaskHandle, TaskError> {
        let url = self.endpoint(catalog::detail(operation).endpoint).map_err(TaskError::Submission)?;
        info!(%operation, %url, "Submitting task.");

        let response = self
            .http
            .post(url.clone())
            .timeout(self.submit_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "Task submission request failed.");
                TaskError::Submission(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Task API rejected submission.");
            return Err(TaskError::Submission(unexpected_status(status)));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TaskError::Submission(format!("unreadable response: {}", e)))?;

        // Some task APIs return numeric ids.
        let id = match body.task_id {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let handle = id
            .and_then(TaskHandle::new)
            .ok_or_else(|| TaskError::Submission("response did not contain a task_id".to_string()))?;

        debug!(task_id = handle.id(), "Task accepted.");
        Ok(handle)
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<TaskPoll, TaskError> {
        let url = self.task_url(handle).map_err(TaskError::Poll)?;

        let response = self
            .http
            .get(url.clone())
            .timeout(self.poll_timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "Task poll request failed.");
                TaskError::Poll(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "Task API rejected poll.");
            return Err(TaskError::Poll(unexpected_status(status)));
        }

        let poll: TaskPoll = response
            .json()
            .await
            .map_err(|e| TaskError::Poll(format!("unreadable response: {}", e)))?;
        debug!(task_id = handle.id(), status = ?poll.status, "Task polled.");
        Ok(poll)
    }
}

fn unexpected_status(status: StatusCode) -> String {
    format!("task API answered {}", status)
}
