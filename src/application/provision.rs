//! Idempotent topic provisioning for model services.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{TopicPair, TopicSpec};
use crate::error::{BrokerError, StartupError};
use crate::port::outbound::broker::Broker;

/// Topic layout used when provisioning model topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProvisioningConfig {
    /// Partitions per topic.
    #[serde(default = "default_partitions")]
    pub partitions: i32,
    /// Replicas per partition.
    #[serde(default = "default_replication_factor")]
    pub replication_factor: i32,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
            replication_factor: default_replication_factor(),
        }
    }
}

const fn default_partitions() -> i32 {
    1
}

const fn default_replication_factor() -> i32 {
    1
}

/// Outcome of [`TopicProvisioner::ensure`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Topics created by this call.
    pub created: Vec<String>,
    /// Topics that were already present.
    pub existing: Vec<String>,
}

/// Ensures a model's input and output topics exist.
///
/// Safe to call on every start: a topic that already exists counts as
/// provisioned.
pub struct TopicProvisioner {
    broker: Arc<dyn Broker>,
    config: ProvisioningConfig,
}

impl TopicProvisioner {
    #[must_use]
    pub fn new(broker: Arc<dyn Broker>, config: ProvisioningConfig) -> Self {
        Self { broker, config }
    }

    #[must_use]
    pub const fn config(&self) -> ProvisioningConfig {
        self.config
    }

    /// Create both topics of `topics` unless they already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Provision`] naming the first topic whose
    /// creation failed for any reason other than pre-existence, or whose
    /// admin connection could not be acquired.
    pub async fn ensure(&self, topics: &TopicPair) -> Result<ProvisionReport, StartupError> {
        let admin = self
            .broker
            .admin()
            .await
            .map_err(|source| StartupError::Provision {
                topic: topics.input_topic().to_string(),
                source,
            })?;

        let mut report = ProvisionReport::default();
        for topic in topics.topics() {
            let spec = TopicSpec::new(
                topic,
                self.config.partitions,
                self.config.replication_factor,
            );
            match admin.create_topic(&spec).await {
                Ok(()) => {
                    debug!(topic, "Topic created");
                    report.created.push(topic.to_string());
                }
                Err(BrokerError::TopicAlreadyExists(_)) => {
                    debug!(topic, "Topic already exists");
                    report.existing.push(topic.to_string());
                }
                Err(source) => {
                    return Err(StartupError::Provision {
                        topic: topic.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelIdentity;
    use crate::testkit::broker::MemoryBroker;

    fn pair() -> TopicPair {
        TopicPair::for_model(&ModelIdentity::try_new("echo", 1, 0).unwrap())
    }

    #[tokio::test]
    async fn creates_both_topics_with_configured_layout() {
        let broker = MemoryBroker::new();
        let provisioner = TopicProvisioner::new(
            Arc::new(broker.clone()),
            ProvisioningConfig {
                partitions: 1,
                replication_factor: 3,
            },
        );

        let report = provisioner.ensure(&pair()).await.unwrap();

        assert_eq!(
            report.created,
            vec![
                "model_server.echo.1.0.inputs".to_string(),
                "model_server.echo.1.0.outputs".to_string()
            ]
        );
        assert!(report.existing.is_empty());
        let spec = broker.topic_spec("model_server.echo.1.0.inputs").unwrap();
        assert_eq!(spec.replication_factor, 3);
    }

    #[tokio::test]
    async fn second_ensure_reports_existing() {
        let broker = MemoryBroker::new();
        let provisioner = TopicProvisioner::new(Arc::new(broker.clone()), Default::default());

        provisioner.ensure(&pair()).await.unwrap();
        let report = provisioner.ensure(&pair()).await.unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.existing.len(), 2);
        assert_eq!(broker.topic_names().len(), 2);
        assert_eq!(broker.create_topic_calls(), 4);
    }

    #[tokio::test]
    async fn other_failures_are_fatal() {
        let broker = MemoryBroker::new();
        broker.fail_topic_creation(BrokerError::Connection("unreachable".into()));
        let provisioner = TopicProvisioner::new(Arc::new(broker), Default::default());

        let err = provisioner.ensure(&pair()).await.unwrap_err();
        match err {
            StartupError::Provision { topic, source } => {
                assert_eq!(topic, "model_server.echo.1.0.inputs");
                assert!(matches!(source, BrokerError::Connection(_)));
            }
            other => panic!("expected provision error, got {other:?}"),
        }
    }
}
