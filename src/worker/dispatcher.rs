//! Routes decoded tasks to their handler

use crate::error::TaskError;
use crate::executor::ProcessExecutor;
use crate::handlers::{GeneSearchHandler, PipelineHandler, RegionSearchHandler};
use crate::species::SpeciesRegistry;
use crate::status::StatusReporter;
use crate::task::{Task, TaskResult};
use crate::worker::WorkerConfig;
use std::sync::Arc;

pub struct Dispatcher {
    region: RegionSearchHandler,
    gene: GeneSearchHandler,
    pipeline: PipelineHandler,
}

impl Dispatcher {
    pub fn new(
        config: &WorkerConfig,
        registry: Arc<SpeciesRegistry>,
        reporter: Arc<dyn StatusReporter>,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Self {
        Self {
            region: RegionSearchHandler::new(
                registry.clone(),
                reporter.clone(),
                config.genomes_dir.clone(),
                config.search_delay,
            ),
            gene: GeneSearchHandler::new(registry, reporter, config.search_delay),
            pipeline: PipelineHandler::new(
                config.genomes_dir.clone(),
                config.pipeline_command.clone(),
                executor,
            ),
        }
    }

    pub async fn dispatch(&self, task: &Task) -> Result<TaskResult, TaskError> {
        match task {
            Task::RegionSearch(t) => self.region.handle(t).await,
            Task::GeneSearch(t) => self.gene.handle(t).await,
            Task::Pipeline(t) => self.pipeline.handle(t).await,
        }
    }
}
