//! RabbitMQ (AMQP 0.9.1) broker on `lapin`

use crate::broker::{Broker, Delivery, TaskChannel};
use crate::error::{Result, WorkerError};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use tracing::{debug, info};

const CONSUMER_TAG: &str = "genome-worker";

#[derive(Debug, Clone, Default)]
pub struct AmqpBroker;

#[async_trait]
impl Broker for AmqpBroker {
    type Channel = AmqpChannel;

    async fn connect(&self, url: &str) -> Result<AmqpChannel> {
        let connection = Connection::connect(
            url,
            ConnectionProperties::default().with_connection_name("genome-worker".into()),
        )
        .await
        .map_err(|e| WorkerError::BrokerError(format!("RabbitMQ connection failed: {}", e)))?;

        let channel = connection.create_channel().await.map_err(|e| {
            WorkerError::BrokerError(format!("RabbitMQ channel creation failed: {}", e))
        })?;

        Ok(AmqpChannel {
            connection,
            channel,
            consumer: None,
        })
    }
}

pub struct AmqpChannel {
    connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
}

#[async_trait]
impl TaskChannel for AmqpChannel {
    async fn declare_durable_queue(&self, queue: &str) -> Result<()> {
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| WorkerError::BrokerError(format!("Queue declare failed: {}", e)))?;
        Ok(())
    }

    async fn start_consuming(&mut self, queue: &str, prefetch: u16) -> Result<()> {
        self.channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| WorkerError::BrokerError(format!("Failed to set QoS: {}", e)))?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| WorkerError::BrokerError(format!("basic_consume failed: {}", e)))?;

        info!("Consuming from {} with prefetch {}", queue, prefetch);
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Result<Option<Delivery>> {
        let consumer = self
            .consumer
            .as_mut()
            .ok_or_else(|| WorkerError::BrokerError("consumer not started".to_string()))?;

        match consumer.next().await {
            Some(Ok(delivery)) => {
                debug!("Delivery {} ({} bytes)", delivery.delivery_tag, delivery.data.len());
                Ok(Some(Delivery {
                    delivery_tag: delivery.delivery_tag,
                    body: delivery.data,
                }))
            }
            Some(Err(e)) => Err(WorkerError::ConnectionLost(e.to_string())),
            None => Ok(None),
        }
    }

    async fn ack(&self, delivery_tag: u64) -> Result<()> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.channel.status().connected() {
            self.channel.close(200, "worker shutdown").await?;
        }
        if self.connection.status().connected() {
            self.connection.close(200, "worker shutdown").await?;
        }
        Ok(())
    }
}
