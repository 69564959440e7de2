use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::{Message, Offset, TopicPartitionList};
use tracing::debug;

use crate::domain::Envelope;
use crate::error::BrokerError;
use crate::port::outbound::broker::MessageConsumer;

pub(super) struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    pub(super) fn subscribe(client_config: ClientConfig, topic: &str) -> Result<Self, BrokerError> {
        let consumer: StreamConsumer = client_config
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        consumer
            .subscribe(&[topic])
            .map_err(|e| BrokerError::Connection(format!("subscribe to {topic}: {e}")))?;
        debug!(topic, "Kafka consumer subscribed");
        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn recv(&mut self) -> Result<Option<Envelope>, BrokerError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| BrokerError::Receive(e.to_string()))?;
        Ok(Some(Envelope {
            payload: message.payload().map(<[u8]>::to_vec),
            partition: Some(message.partition()),
            offset: Some(message.offset()),
        }))
    }

    async fn commit(&mut self, envelope: &Envelope) -> Result<(), BrokerError> {
        let (Some(partition), Some(offset)) = (envelope.partition, envelope.offset) else {
            return Ok(());
        };
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&self.topic, partition, Offset::Offset(offset + 1))
            .map_err(|e| BrokerError::Commit(e.to_string()))?;
        self.consumer
            .commit(&offsets, CommitMode::Async)
            .map_err(|e| BrokerError::Commit(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        self.consumer.unsubscribe();
        debug!(topic = %self.topic, "Kafka consumer unsubscribed");
        Ok(())
    }
}
