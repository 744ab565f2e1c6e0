//! Job status reporting to the external status API
//!
//! Reporting is best effort: a failed update is logged and the worker moves on.

use crate::error::{Result, WorkerError};
use crate::worker::WorkerConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Job lifecycle states this worker emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Body of `POST /api/genome/jobs/update`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusUpdate {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusUpdate {
    pub fn processing(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Processing,
            result: None,
            error: None,
        }
    }

    pub fn completed(job_id: &str, result: Value) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(job_id: &str, error: impl Into<String>, result: Option<Value>) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            result,
            error: Some(error.into()),
        }
    }
}

/// Sink for job status transitions.
///
/// Implementations never return an error: `false` means the update was lost.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, update: JobStatusUpdate) -> bool;
}

/// HTTP implementation posting JSON to the status API
#[derive(Debug, Clone)]
pub struct ApiStatusReporter {
    client: Client,
    endpoint: Url,
}

impl ApiStatusReporter {
    pub fn new(config: &WorkerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.status_timeout)
            .build()
            .map_err(|e| WorkerError::StatusApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.status_endpoint()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, update: &JobStatusUpdate) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(update)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::StatusApiError(format!(
                "status {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl StatusReporter for ApiStatusReporter {
    async fn report(&self, update: JobStatusUpdate) -> bool {
        match self.send(&update).await {
            Ok(()) => {
                debug!("Job {} status updated to {}", update.job_id, update.status);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to update job {} to {}: {}",
                    update.job_id, update.status, e
                );
                false
            }
        }
    }
}
