//! Task handlers, one per task type
//!
//! - RegionSearchHandler: region lookup stub, reports its own status
//! - GeneSearchHandler: gene lookup stub, reports its own status
//! - PipelineHandler: runs the external pipeline, leaves reporting to the caller

pub mod gene;
pub mod pipeline;
pub mod region;

pub use gene::GeneSearchHandler;
pub use pipeline::PipelineHandler;
pub use region::RegionSearchHandler;

use crate::error::TaskError;
use crate::species::{SpeciesEntry, SpeciesRegistry};
use crate::status::{JobStatusUpdate, StatusReporter};

/// Status plumbing shared by the self-reporting search handlers
pub(crate) struct JobTracker<'a> {
    reporter: &'a dyn StatusReporter,
    job_id: Option<&'a str>,
}

impl<'a> JobTracker<'a> {
    pub(crate) fn new(reporter: &'a dyn StatusReporter, job_id: Option<&'a str>) -> Self {
        Self { reporter, job_id }
    }

    pub(crate) async fn processing(&self) {
        if let Some(job_id) = self.job_id {
            self.reporter.report(JobStatusUpdate::processing(job_id)).await;
        }
    }

    pub(crate) async fn completed(&self, result: &serde_json::Value) {
        if let Some(job_id) = self.job_id {
            self.reporter
                .report(JobStatusUpdate::completed(job_id, result.clone()))
                .await;
        }
    }

    /// Report the terminal failure and hand the error back for propagation
    pub(crate) async fn fail(&self, error: TaskError) -> TaskError {
        if let Some(job_id) = self.job_id {
            self.reporter
                .report(JobStatusUpdate::failed(job_id, error.to_string(), None))
                .await;
        }
        error
    }

    pub(crate) async fn lookup_species<'r>(
        &self,
        registry: &'r SpeciesRegistry,
        species: &str,
    ) -> Result<&'r SpeciesEntry, TaskError> {
        match registry.get(species) {
            Some(entry) => Ok(entry),
            None => Err(self
                .fail(TaskError::UnknownSpecies(species.to_string()))
                .await),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::status::{JobStatusUpdate, StatusReporter};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Reporter that records every update
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        updates: Mutex<Vec<JobStatusUpdate>>,
    }

    impl RecordingReporter {
        pub(crate) fn updates(&self) -> Vec<JobStatusUpdate> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusReporter for RecordingReporter {
        async fn report(&self, update: JobStatusUpdate) -> bool {
            self.updates.lock().unwrap().push(update);
            true
        }
    }
}
