//! Message broker abstraction
//!
//! - [`Broker`]: opens channels to a broker URL
//! - [`TaskChannel`]: one consuming channel (declare, consume, ack, close)
//! - [`AmqpBroker`]: RabbitMQ implementation on `lapin`
//! - [`connect_with_retry`]: the worker's only way to obtain a channel

pub mod amqp;
pub mod connection;

pub use amqp::{AmqpBroker, AmqpChannel};
pub use connection::connect_with_retry;

use crate::error::Result;
use async_trait::async_trait;

/// One message taken off the queue, not yet acknowledged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Broker: Send + Sync {
    type Channel: TaskChannel;

    async fn connect(&self, url: &str) -> Result<Self::Channel>;
}

#[async_trait]
pub trait TaskChannel: Send + Sync {
    /// Declare the queue as durable; idempotent
    async fn declare_durable_queue(&self, queue: &str) -> Result<()>;

    /// Register as a consumer with the given prefetch window
    async fn start_consuming(&mut self, queue: &str, prefetch: u16) -> Result<()>;

    /// Wait for the next delivery. `Ok(None)` means the stream ended.
    async fn next_delivery(&mut self) -> Result<Option<Delivery>>;

    async fn ack(&self, delivery_tag: u64) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
