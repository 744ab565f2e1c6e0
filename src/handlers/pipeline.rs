//! Pipeline handler: runs the external genome pipeline wrapper
//!
//! Input is either a `genome_file` relative to the genomes root or a raw
//! `args` list. `options` entries become environment variables of the child.
//! This handler does not post job status; the consumer does.

use crate::error::TaskError;
use crate::executor::{PipelineCommand, ProcessExecutor};
use crate::task::{PipelineTask, TaskResult};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PipelineHandler {
    genomes_dir: PathBuf,
    pipeline_command: Vec<String>,
    executor: Arc<dyn ProcessExecutor>,
}

impl PipelineHandler {
    pub fn new(
        genomes_dir: PathBuf,
        pipeline_command: Vec<String>,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Self {
        Self {
            genomes_dir,
            pipeline_command,
            executor,
        }
    }

    pub async fn handle(&self, task: &PipelineTask) -> Result<TaskResult, TaskError> {
        let command = self.build_command(task).await?;
        let display = command.display();

        let outcome = self
            .executor
            .run(&command)
            .await
            .map_err(|source| TaskError::SpawnFailed {
                command: display.clone(),
                source,
            })?;

        let details = json!({
            "exitCode": outcome.exit_code,
            "durationSecs": outcome.duration.as_secs_f64(),
            "command": display,
        });

        if outcome.success() {
            info!("Pipeline completed successfully");
            return Ok(TaskResult::Completed(details));
        }

        let error = match outcome.exit_code {
            Some(code) => format!("Pipeline exited with code {}", code),
            None => "Pipeline terminated by signal".to_string(),
        };
        Ok(TaskResult::Failed {
            error,
            details: Some(details),
        })
    }

    /// Resolve inputs and environment; fails before anything is spawned
    pub async fn build_command(&self, task: &PipelineTask) -> Result<PipelineCommand, TaskError> {
        let mut argv = self.pipeline_command.clone();

        match task.genome_file.as_deref().filter(|f| !f.is_empty()) {
            Some(genome_file) => {
                let path = self.resolve_genome_file(genome_file).await?;
                argv.push(path.display().to_string());
            }
            None => {
                debug!("No genome_file in task, using raw args");
                match task.args.as_deref() {
                    Some(args) if !args.is_empty() => argv.extend(args.iter().cloned()),
                    _ => {
                        return Err(TaskError::MissingInput(
                            "either genome_file or a non-empty args list is required".to_string(),
                        ))
                    }
                }
            }
        }

        let env_overlay = options_to_env(task.options.as_ref());
        if !env_overlay.is_empty() {
            info!("Applying pipeline options: {:?}", env_overlay);
        }

        Ok(PipelineCommand { argv, env_overlay })
    }

    async fn resolve_genome_file(&self, genome_file: &str) -> Result<PathBuf, TaskError> {
        let relative = Path::new(genome_file);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(TaskError::InvalidGenomePath(genome_file.to_string()));
        }

        let path = self.genomes_dir.join(relative);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(TaskError::GenomeFileNotFound(path));
        }

        Ok(path)
    }
}

/// Environment overlay from task `options`. No allow-list is applied.
pub fn options_to_env(options: Option<&Map<String, Value>>) -> HashMap<String, String> {
    options
        .map(|opts| {
            opts.iter()
                .map(|(key, value)| (key.clone(), option_value_to_string(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn option_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
