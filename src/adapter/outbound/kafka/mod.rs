//! Kafka broker adapter.
//!
//! Connection settings are always available so configuration can be parsed
//! and checked in any build. The client itself needs the `kafka` feature
//! (librdkafka via `rdkafka`).

pub mod settings;

#[cfg(feature = "kafka")]
mod admin;
#[cfg(feature = "kafka")]
mod consumer;
#[cfg(feature = "kafka")]
mod producer;

pub use settings::{BrokerConfig, OffsetReset};

#[cfg(feature = "kafka")]
pub use client::KafkaBroker;

#[cfg(feature = "kafka")]
mod client {
    use async_trait::async_trait;
    use rdkafka::config::ClientConfig;

    use super::admin::KafkaAdmin;
    use super::consumer::KafkaConsumer;
    use super::producer::KafkaProducer;
    use super::settings::BrokerConfig;
    use crate::error::BrokerError;
    use crate::port::outbound::broker::{Broker, MessageConsumer, MessageProducer, TopicAdmin};

    /// Client properties set from dedicated settings fields.
    const MANAGED_KEYS: &[&str] = &[
        "bootstrap.servers",
        "group.id",
        "enable.auto.commit",
        "auto.offset.reset",
    ];

    /// [`Broker`] backed by librdkafka. Every handle gets its own client.
    #[derive(Debug, Clone)]
    pub struct KafkaBroker {
        config: BrokerConfig,
    }

    impl KafkaBroker {
        #[must_use]
        pub fn new(config: BrokerConfig) -> Self {
            Self { config }
        }

        /// Base client config: bootstrap address plus passthrough properties.
        fn client_config(&self) -> ClientConfig {
            let mut client_config = ClientConfig::new();
            client_config.set("bootstrap.servers", &self.config.address);
            for (key, value) in &self.config.properties {
                if !MANAGED_KEYS.contains(&key.as_str()) {
                    client_config.set(key, value);
                }
            }
            client_config
        }
    }

    #[async_trait]
    impl Broker for KafkaBroker {
        fn name(&self) -> &'static str {
            "kafka"
        }

        async fn admin(&self) -> Result<Box<dyn TopicAdmin>, BrokerError> {
            Ok(Box::new(KafkaAdmin::connect(self.client_config())?))
        }

        async fn consumer(&self, topic: &str) -> Result<Box<dyn MessageConsumer>, BrokerError> {
            let mut client_config = self.client_config();
            client_config
                .set("group.id", &self.config.group_id)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", self.config.offset_reset.as_str());
            Ok(Box::new(KafkaConsumer::subscribe(client_config, topic)?))
        }

        async fn producer(&self) -> Result<Box<dyn MessageProducer>, BrokerError> {
            Ok(Box::new(KafkaProducer::connect(self.client_config())?))
        }
    }
}
