//! Region search: extract a chromosome interval from a species genome
//!
//! Sequence extraction is not implemented yet; the handler validates the
//! request, checks the genome file and echoes the parameters back.

use crate::error::TaskError;
use crate::handlers::JobTracker;
use crate::species::SpeciesRegistry;
use crate::status::StatusReporter;
use crate::task::{RegionSearchTask, TaskResult, REGION_SEARCH};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct RegionSearchHandler {
    registry: Arc<SpeciesRegistry>,
    reporter: Arc<dyn StatusReporter>,
    genomes_dir: PathBuf,
    delay: Duration,
}

impl RegionSearchHandler {
    pub fn new(
        registry: Arc<SpeciesRegistry>,
        reporter: Arc<dyn StatusReporter>,
        genomes_dir: PathBuf,
        delay: Duration,
    ) -> Self {
        Self {
            registry,
            reporter,
            genomes_dir,
            delay,
        }
    }

    pub async fn handle(&self, task: &RegionSearchTask) -> Result<TaskResult, TaskError> {
        let tracker = JobTracker::new(self.reporter.as_ref(), task.job_id.as_deref());
        tracker.processing().await;

        let entry = tracker.lookup_species(&self.registry, &task.species).await?;
        let (chromosome, from, to) = match validate_region(task) {
            Ok(region) => region,
            Err(e) => return Err(tracker.fail(e).await),
        };

        info!(
            "Region search: {} {}:{}-{}",
            task.species, chromosome, from, to
        );

        let genome_path = self.genomes_dir.join(&entry.genome_file);
        let genome_file_exists = tokio::fs::try_exists(&genome_path).await.unwrap_or(false);
        if !genome_file_exists {
            warn!("Genome file not found: {}", genome_path.display());
        }

        // TODO: replace the delay with samtools-style extraction once genome indexes are mounted
        tokio::time::sleep(self.delay).await;

        let mut result = json!({
            "type": REGION_SEARCH,
            "params": {
                "species": task.species,
                "chromosome": chromosome,
                "fromPosition": from,
                "toPosition": to,
            },
            "speciesName": entry.name,
            "genomeFile": entry.genome_file.display().to_string(),
            "genomeFileExists": genome_file_exists,
            "sequences": [],
        });
        if !genome_file_exists {
            result["note"] = json!("Genome file not available; sequence extraction skipped");
        }

        tracker.completed(&result).await;
        Ok(TaskResult::Completed(result))
    }
}

fn validate_region(task: &RegionSearchTask) -> Result<(&str, u64, u64), TaskError> {
    let chromosome = task
        .chromosome
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| TaskError::MissingInput("chromosome".to_string()))?;
    let from = task
        .from_position
        .ok_or_else(|| TaskError::MissingInput("fromPosition".to_string()))?;
    let to = task
        .to_position
        .ok_or_else(|| TaskError::MissingInput("toPosition".to_string()))?;

    if from > to {
        return Err(TaskError::InvalidRegion(format!(
            "fromPosition {} is greater than toPosition {}",
            from, to
        )));
    }

    Ok((chromosome, from, to))
}
