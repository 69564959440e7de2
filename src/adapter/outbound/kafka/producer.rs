use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use crate::error::BrokerError;
use crate::port::outbound::broker::MessageProducer;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) struct KafkaProducer {
    producer: FutureProducer,
}

impl KafkaProducer {
    pub(super) fn connect(mut client_config: ClientConfig) -> Result<Self, BrokerError> {
        client_config.set("message.timeout.ms", DELIVERY_TIMEOUT.as_millis().to_string());
        let producer = client_config
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let record = FutureRecord::<(), [u8]>::to(topic).payload(payload);
        self.producer
            .send(record, DELIVERY_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|(e, _)| BrokerError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BrokerError> {
        self.producer
            .flush(FLUSH_TIMEOUT)
            .map_err(|e| BrokerError::Close(format!("flush failed: {e}")))
    }
}
