//! Genome Worker CLI
//!
//! Consumes genome search and pipeline tasks from RabbitMQ.
//! Supports a continuous worker mode and a single-message mode.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use genome_worker::worker::{setup_signal_handler, Dispatcher, TaskRunner, WorkerConfig};
use genome_worker::worker::config::{
    DEFAULT_API_BASE_URL, DEFAULT_BROKER_URL, DEFAULT_GENOMES_DIR, DEFAULT_PIPELINE_SCRIPT,
    DEFAULT_QUEUE_NAME,
};
use genome_worker::{AmqpBroker, ApiStatusReporter, SpeciesRegistry, SystemExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genome-worker")]
#[command(about = "Consume genome search and pipeline tasks from RabbitMQ")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    worker: WorkerArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the worker until interrupted (default)
    Run,

    /// Process a single message and exit
    Once,

    /// Print the species registry
    Species {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct WorkerArgs {
    /// AMQP broker URL
    #[arg(long, env = "RABBITMQ_URL", default_value = DEFAULT_BROKER_URL)]
    broker_url: String,

    /// Queue to consume from
    #[arg(long, env = "QUEUE_NAME", default_value = DEFAULT_QUEUE_NAME)]
    queue: String,

    /// Base URL of the job status API
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Root directory of the genome files
    #[arg(long, env = "GENOMES_DIR", default_value = DEFAULT_GENOMES_DIR)]
    genomes_dir: PathBuf,

    /// Pipeline wrapper script, run with /bin/bash
    #[arg(long, env = "PIPELINE_SCRIPT", default_value = DEFAULT_PIPELINE_SCRIPT)]
    pipeline_script: String,

    /// JSON species registry replacing the built-in table
    #[arg(long, env = "SPECIES_REGISTRY")]
    species_file: Option<PathBuf>,

    /// Seconds between broker connection attempts
    #[arg(long, default_value = "5")]
    reconnect_interval: u64,

    /// Status API request timeout in seconds
    #[arg(long, default_value = "10")]
    status_timeout: u64,
}

fn load_registry(species_file: Option<&PathBuf>) -> Result<SpeciesRegistry> {
    match species_file {
        Some(path) => Ok(SpeciesRegistry::from_json_file(path)?),
        None => Ok(SpeciesRegistry::builtin()),
    }
}

fn build_runner(args: &WorkerArgs) -> Result<TaskRunner<AmqpBroker>> {
    let config = WorkerConfig::builder()
        .broker_url(&args.broker_url)
        .queue_name(&args.queue)
        .api_base_url(&args.api_base_url)
        .genomes_dir(&args.genomes_dir)
        .pipeline_script(&args.pipeline_script)
        .reconnect_interval(Duration::from_secs(args.reconnect_interval))
        .status_timeout(Duration::from_secs(args.status_timeout))
        .build()
        .context("Invalid worker configuration")?;
    let config = Arc::new(config);

    let registry = Arc::new(load_registry(args.species_file.as_ref())?);
    info!("Species registry: {} entries", registry.len());

    let reporter = Arc::new(ApiStatusReporter::new(&config)?);
    info!("Status endpoint: {}", reporter.endpoint());

    let dispatcher = Dispatcher::new(
        &config,
        registry,
        reporter.clone(),
        Arc::new(SystemExecutor),
    );

    Ok(TaskRunner::new(AmqpBroker, config, dispatcher, reporter))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present, before clap reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = cli.worker;
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let runner = build_runner(&args)?;

            // Setup graceful shutdown
            setup_signal_handler(runner.shutdown_handle());

            runner.run().await?;
        }

        Commands::Once => {
            let runner = build_runner(&args)?;
            setup_signal_handler(runner.shutdown_handle());

            if runner.run_once().await? {
                info!("Message processed");
            } else {
                info!("Stopped before a message arrived");
            }
        }

        Commands::Species { json } => {
            let registry = load_registry(args.species_file.as_ref())?;
            if json {
                let table: std::collections::BTreeMap<_, _> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                for (id, entry) in registry.iter() {
                    println!("{:<24} {:<36} {}", id, entry.name, entry.genome_file.display());
                }
            }
        }
    }

    Ok(())
}
