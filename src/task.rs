//! Task message model and decoding
//!
//! Messages are untrusted JSON. Only the `type` tag is inspected up front;
//! everything else is checked by the handler that receives the task.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const REGION_SEARCH: &str = "region_search";
pub const GENE_SEARCH: &str = "gene_search";

/// Routing decision taken from the message's `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    RegionSearch,
    GeneSearch,
    /// No recognized `type`: messages predating the field run the pipeline
    LegacyPipeline,
}

impl TaskType {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(REGION_SEARCH) => TaskType::RegionSearch,
            Some(GENE_SEARCH) => TaskType::GeneSearch,
            _ => TaskType::LegacyPipeline,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::RegionSearch => REGION_SEARCH,
            TaskType::GeneSearch => GENE_SEARCH,
            TaskType::LegacyPipeline => "pipeline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSearchTask {
    pub job_id: Option<String>,
    #[serde(default)]
    pub species: String,
    pub chromosome: Option<String>,
    pub from_position: Option<u64>,
    pub to_position: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneSearchTask {
    pub job_id: Option<String>,
    #[serde(default)]
    pub species: String,
    pub gene_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineTask {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
    pub genome_file: Option<String>,
    pub args: Option<Vec<String>>,
    pub options: Option<Map<String, Value>>,
}

/// A decoded task, one variant per handler
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    RegionSearch(RegionSearchTask),
    GeneSearch(GeneSearchTask),
    Pipeline(PipelineTask),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message body is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("message body is not a JSON object")]
    NotAnObject,

    #[error("invalid {task_type} task: {source}")]
    InvalidFields {
        task_type: &'static str,
        job_id: Option<String>,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The `jobId` recovered from a body that parsed as JSON but not as a task
    pub fn salvaged_job_id(&self) -> Option<&str> {
        match self {
            DecodeError::InvalidFields { job_id, .. } => job_id.as_deref(),
            _ => None,
        }
    }
}

impl Task {
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(body).map_err(DecodeError::NotJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
        let task_type = TaskType::from_tag(object.get("type").and_then(Value::as_str));
        let job_id = object
            .get("jobId")
            .and_then(Value::as_str)
            .map(str::to_string);

        let invalid = |source| DecodeError::InvalidFields {
            task_type: task_type.as_str(),
            job_id: job_id.clone(),
            source,
        };

        let task = match task_type {
            TaskType::RegionSearch => {
                Task::RegionSearch(serde_json::from_value(value).map_err(invalid)?)
            }
            TaskType::GeneSearch => Task::GeneSearch(serde_json::from_value(value).map_err(invalid)?),
            TaskType::LegacyPipeline => {
                Task::Pipeline(serde_json::from_value(value).map_err(invalid)?)
            }
        };

        Ok(task)
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Task::RegionSearch(_) => TaskType::RegionSearch,
            Task::GeneSearch(_) => TaskType::GeneSearch,
            Task::Pipeline(_) => TaskType::LegacyPipeline,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Task::RegionSearch(t) => t.job_id.as_deref(),
            Task::GeneSearch(t) => t.job_id.as_deref(),
            Task::Pipeline(t) => t.job_id.as_deref(),
        }
    }

    /// Search handlers post their own status updates; the pipeline
    /// handler leaves that to the consumer.
    pub fn reports_own_status(&self) -> bool {
        !matches!(self, Task::Pipeline(_))
    }
}

/// Outcome of a handler that ran to the end
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Completed(Value),
    Failed { error: String, details: Option<Value> },
}

impl TaskResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed(_))
    }
}
