//! External process execution for the genome pipeline

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};

/// A fully resolved command line.
///
/// The child inherits the worker's environment with `env_overlay` applied on top.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCommand {
    pub argv: Vec<String>,
    pub env_overlay: HashMap<String, String>,
}

impl PipelineCommand {
    /// Command line joined for logs and result payloads
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Exit information of a finished process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a command to completion.
///
/// There is no timeout: a stuck pipeline holds the worker until it exits.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn run(&self, command: &PipelineCommand) -> std::io::Result<ProcessOutcome>;
}

/// Spawns real child processes, inheriting stdout/stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl ProcessExecutor for SystemExecutor {
    async fn run(&self, command: &PipelineCommand) -> std::io::Result<ProcessOutcome> {
        let (program, args) = command.argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
        })?;

        info!("Executing pipeline: {}", command.display());
        let started = Instant::now();

        let status = Command::new(program)
            .args(args)
            .envs(&command.env_overlay)
            .status()
            .await?;

        let outcome = ProcessOutcome {
            exit_code: status.code(),
            duration: started.elapsed(),
        };

        match outcome.exit_code {
            Some(code) => info!(
                "Pipeline exited with code {} after {:.2}s",
                code,
                outcome.duration.as_secs_f64()
            ),
            None => warn!(
                "Pipeline terminated by signal after {:.2}s",
                outcome.duration.as_secs_f64()
            ),
        }

        Ok(outcome)
    }
}
