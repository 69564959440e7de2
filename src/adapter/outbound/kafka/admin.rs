use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::types::RDKafkaErrorCode;

use crate::domain::TopicSpec;
use crate::error::BrokerError;
use crate::port::outbound::broker::TopicAdmin;

const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

pub(super) struct KafkaAdmin {
    client: AdminClient<DefaultClientContext>,
}

impl KafkaAdmin {
    pub(super) fn connect(client_config: ClientConfig) -> Result<Self, BrokerError> {
        let client = client_config
            .create()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TopicAdmin for KafkaAdmin {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<(), BrokerError> {
        let topic = NewTopic::new(
            &spec.name,
            spec.partitions,
            TopicReplication::Fixed(spec.replication_factor),
        );
        let options = AdminOptions::new().operation_timeout(Some(OPERATION_TIMEOUT));

        let results = self
            .client
            .create_topics([&topic], &options)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        for result in results {
            match result {
                Ok(_) => {}
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    return Err(BrokerError::TopicAlreadyExists(name));
                }
                Err((name, code)) => {
                    return Err(BrokerError::TopicCreation {
                        topic: name,
                        reason: code.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
