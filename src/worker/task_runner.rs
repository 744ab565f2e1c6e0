//! Task runner - main consumer loop

use crate::broker::{connect_with_retry, Broker, Delivery, TaskChannel};
use crate::error::{Result, TaskError, WorkerError};
use crate::status::{JobStatusUpdate, StatusReporter};
use crate::task::{Task, TaskResult};
use crate::worker::config::PREFETCH_COUNT;
use crate::worker::{Dispatcher, WorkerConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Consumes the task queue one message at a time until shutdown is signaled
pub struct TaskRunner<B: Broker> {
    broker: B,
    config: Arc<WorkerConfig>,
    dispatcher: Dispatcher,
    reporter: Arc<dyn StatusReporter>,
    shutdown: CancellationToken,
    processed: AtomicU64,
}

impl<B: Broker> TaskRunner<B> {
    /// Create a new task runner
    pub fn new(
        broker: B,
        config: Arc<WorkerConfig>,
        dispatcher: Dispatcher,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self::with_shutdown(broker, config, dispatcher, reporter, CancellationToken::new())
    }

    /// Create a task runner stopped by an externally owned token
    pub fn with_shutdown(
        broker: B,
        config: Arc<WorkerConfig>,
        dispatcher: Dispatcher,
        reporter: Arc<dyn StatusReporter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            broker,
            config,
            dispatcher,
            reporter,
            shutdown,
            processed: AtomicU64::new(0),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of deliveries processed and acknowledged so far
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Main worker loop
    ///
    /// Consumes until shutdown is signaled. A lost delivery stream sends the
    /// runner back through the connection manager.
    pub async fn run(&self) -> Result<()> {
        info!("Starting genome worker...");
        info!("Broker: {}", self.config.broker_url_redacted());
        info!("Queue: {}", self.config.queue_name);
        info!("Genomes directory: {}", self.config.genomes_dir.display());

        while !self.shutdown.is_cancelled() {
            let mut channel = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                channel = self.open_consumer() => channel,
            };

            let consumed = self.consume(&mut channel).await;
            if let Err(e) = channel.close().await {
                warn!("Failed to close broker connection: {}", e);
            }

            match consumed {
                Ok(()) => break,
                Err(e) => {
                    warn!("Consumer stopped: {}. Reconnecting...", e);
                }
            }
        }

        info!("Worker stopped after {} messages", self.processed_count());
        Ok(())
    }

    /// Wait for and process a single message, then close the connection
    ///
    /// Returns:
    /// - Ok(true) if a message was processed
    /// - Ok(false) if shutdown was signaled first
    pub async fn run_once(&self) -> Result<bool> {
        info!("Running worker in single-message mode...");
        let mut channel = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Ok(false),
            channel = self.open_consumer() => channel,
        };

        let next = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Ok(None),
            next = channel.next_delivery() => next,
        };

        let processed = match next {
            Ok(Some(delivery)) => {
                self.process_delivery(&channel, delivery).await;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };

        if let Err(e) = channel.close().await {
            warn!("Failed to close broker connection: {}", e);
        }
        processed
    }

    async fn open_consumer(&self) -> B::Channel {
        let redacted = self.config.broker_url_redacted();
        loop {
            let mut channel = connect_with_retry(
                &self.broker,
                &self.config.broker_url,
                &redacted,
                &self.config.queue_name,
                self.config.reconnect_interval,
            )
            .await;

            match channel
                .start_consuming(&self.config.queue_name, PREFETCH_COUNT)
                .await
            {
                Ok(()) => {
                    info!(
                        "Waiting for messages in queue: {}",
                        self.config.queue_name
                    );
                    return channel;
                }
                Err(e) => {
                    warn!("Failed to start consumer: {}", e);
                    if let Err(e) = channel.close().await {
                        warn!("Failed to close broker connection: {}", e);
                    }
                    sleep(self.config.reconnect_interval).await;
                }
            }
        }
    }

    /// Consume until shutdown (`Ok`) or until the delivery stream breaks (`Err`).
    ///
    /// Shutdown is only observed between messages; a running task always finishes.
    async fn consume(&self, channel: &mut B::Channel) -> Result<()> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping consumer...");
                    return Ok(());
                }
                next = channel.next_delivery() => next,
            };

            match next? {
                Some(delivery) => self.process_delivery(channel, delivery).await,
                None => {
                    return Err(WorkerError::ConnectionLost(
                        "delivery stream ended".to_string(),
                    ))
                }
            }
        }
    }

    /// Handle one delivery and acknowledge it exactly once, whatever the outcome
    pub async fn process_delivery(&self, channel: &B::Channel, delivery: Delivery) {
        let tag = delivery.delivery_tag;
        info!("Received task (delivery {})", tag);

        self.handle_body(&delivery.body).await;

        if let Err(e) = channel.ack(tag).await {
            error!("Failed to acknowledge delivery {}: {}", tag, e);
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
        info!("Done with delivery {}", tag);
    }

    async fn handle_body(&self, body: &[u8]) {
        let task = match Task::decode(body) {
            Ok(task) => task,
            Err(e) => {
                error!("Error processing task: {}", e);
                if let Some(job_id) = e.salvaged_job_id() {
                    self.reporter
                        .report(JobStatusUpdate::failed(job_id, e.to_string(), None))
                        .await;
                }
                return;
            }
        };

        let job_id = task.job_id();
        let owns_status = !task.reports_own_status();
        info!(
            "Dispatching {} task (job {})",
            task.task_type().as_str(),
            job_id.unwrap_or("untracked")
        );

        if let (true, Some(job_id)) = (owns_status, job_id) {
            self.reporter.report(JobStatusUpdate::processing(job_id)).await;
        }

        let outcome = self.dispatcher.dispatch(&task).await;
        match &outcome {
            Ok(TaskResult::Completed(_)) => info!("Task completed successfully"),
            Ok(TaskResult::Failed { error, .. }) => warn!("Task failed: {}", error),
            Err(e) => error!("Error processing task: {}", e),
        }

        if let (true, Some(job_id)) = (owns_status, job_id) {
            self.reporter.report(terminal_update(job_id, outcome)).await;
        }
    }
}

fn terminal_update(job_id: &str, outcome: std::result::Result<TaskResult, TaskError>) -> JobStatusUpdate {
    match outcome {
        Ok(TaskResult::Completed(result)) => JobStatusUpdate::completed(job_id, result),
        Ok(TaskResult::Failed { error, details }) => JobStatusUpdate::failed(job_id, error, details),
        Err(e) => JobStatusUpdate::failed(job_id, e.to_string(), None),
    }
}

/// Setup signal handlers for graceful shutdown
pub fn setup_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, finishing current task before shutdown..."),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
            },
            _ = terminate => info!("Received SIGTERM, finishing current task before shutdown..."),
        }
        shutdown.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_update_mapping() {
        let completed = terminal_update("j", Ok(TaskResult::Completed(json!({"exitCode": 0}))));
        assert_eq!(completed.status, crate::status::JobStatus::Completed);

        let failed = terminal_update(
            "j",
            Ok(TaskResult::Failed {
                error: "Pipeline exited with code 1".into(),
                details: Some(json!({"exitCode": 1})),
            }),
        );
        assert_eq!(failed.error.as_deref(), Some("Pipeline exited with code 1"));
        assert_eq!(failed.result, Some(json!({"exitCode": 1})));

        let errored = terminal_update("j", Err(TaskError::MissingInput("args".into())));
        assert_eq!(errored.error.as_deref(), Some("Missing input: args"));
        assert!(errored.result.is_none());
    }

    // Consumer loop behavior is covered in tests/consumer.rs with an in-memory broker
}
