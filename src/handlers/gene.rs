//! Gene search: resolve a gene identifier within a species
//!
//! The coordinate lookup itself is a stub; this handler owns the status envelope.

use crate::error::TaskError;
use crate::handlers::JobTracker;
use crate::species::SpeciesRegistry;
use crate::status::StatusReporter;
use crate::task::{GeneSearchTask, TaskResult, GENE_SEARCH};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct GeneSearchHandler {
    registry: Arc<SpeciesRegistry>,
    reporter: Arc<dyn StatusReporter>,
    delay: Duration,
}

impl GeneSearchHandler {
    pub fn new(
        registry: Arc<SpeciesRegistry>,
        reporter: Arc<dyn StatusReporter>,
        delay: Duration,
    ) -> Self {
        Self {
            registry,
            reporter,
            delay,
        }
    }

    pub async fn handle(&self, task: &GeneSearchTask) -> Result<TaskResult, TaskError> {
        let tracker = JobTracker::new(self.reporter.as_ref(), task.job_id.as_deref());
        tracker.processing().await;

        let entry = tracker.lookup_species(&self.registry, &task.species).await?;
        let gene_id = task.gene_id.as_deref();

        info!(
            "Gene search: {} in {}",
            gene_id.unwrap_or("<none>"),
            task.species
        );
        tokio::time::sleep(self.delay).await;

        let result = json!({
            "type": GENE_SEARCH,
            "params": {
                "species": task.species,
                "geneId": gene_id,
            },
            "speciesName": entry.name,
            "genes": [],
        });

        tracker.completed(&result).await;
        Ok(TaskResult::Completed(result))
    }
}
