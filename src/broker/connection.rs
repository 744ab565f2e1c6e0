//! Connection manager: obtain a consuming channel, retrying forever

use crate::broker::{Broker, TaskChannel};
use crate::error::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Connect to the broker and declare `queue` as durable.
///
/// Never gives up: every failure is logged and retried after `retry_interval`.
/// The worker has nothing else to do without a channel.
pub async fn connect_with_retry<B: Broker>(
    broker: &B,
    url: &str,
    redacted_url: &str,
    queue: &str,
    retry_interval: Duration,
) -> B::Channel {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        match try_connect(broker, url, queue).await {
            Ok(channel) => {
                info!(
                    "Connected to broker at {} (attempt {}), queue {} declared",
                    redacted_url, attempt, queue
                );
                return channel;
            }
            Err(e) => {
                warn!(
                    "Broker not reachable at {} (attempt {}): {}. Retrying in {:?}",
                    redacted_url, attempt, e, retry_interval
                );
                sleep(retry_interval).await;
            }
        }
    }
}

async fn try_connect<B: Broker>(broker: &B, url: &str, queue: &str) -> Result<B::Channel> {
    let channel = broker.connect(url).await?;
    if let Err(e) = channel.declare_durable_queue(queue).await {
        if let Err(close_err) = channel.close().await {
            warn!("Failed to close broker connection: {}", close_err);
        }
        return Err(e);
    }
    Ok(channel)
}
