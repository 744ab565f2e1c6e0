//! Genome Worker - queue consumer for genome search and pipeline tasks
//!
//! The worker takes task messages off a durable RabbitMQ queue one at a time,
//! routes each to a handler by its `type` field, and reports job progress to
//! the status API:
//! - `region_search` / `gene_search`: species lookups (extraction is stubbed)
//! - anything else: the external genome pipeline wrapper
//!
//! Every message is acknowledged exactly once, whether the task succeeded,
//! failed, or could not be decoded.

pub mod broker;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod species;
pub mod status;
pub mod task;
pub mod worker;

pub use broker::{AmqpBroker, Broker, Delivery, TaskChannel};
pub use error::{Result, TaskError, WorkerError};
pub use executor::{PipelineCommand, ProcessExecutor, ProcessOutcome, SystemExecutor};
pub use species::{SpeciesEntry, SpeciesRegistry};
pub use status::{ApiStatusReporter, JobStatus, JobStatusUpdate, StatusReporter};
pub use task::{Task, TaskResult, TaskType};
pub use worker::{Dispatcher, TaskRunner, WorkerConfig};
