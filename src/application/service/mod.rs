//! A single model service: one consumer, one producer, one predictor.
//!
//! # Lifecycle
//!
//! 1. [`ModelService::start`] provisions the topic pair and connects the
//!    consumer and producer (`Created` → `Started`)
//! 2. [`ModelService::process`] runs the consume → predict → produce loop
//!    until cancelled or the input stream closes (`Started` → `Processing`)
//! 3. [`ModelService::stop`] releases whatever connections are held
//!    (any state → `Stopped`)
//!
//! A failed `start` releases anything it acquired and leaves the service in
//! `Created`, so the call can be retried.

mod codec;
mod config;
mod process;
mod stats;

pub(crate) use process::cancelled;
pub use config::{DeliveryPolicy, ServiceConfig};
pub use stats::{ServiceStats, StatsSnapshot};

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument, Span};

use crate::application::gateway::PredictionGateway;
use crate::application::provision::{ProvisioningConfig, TopicProvisioner};
use crate::domain::{ModelIdentity, ServiceState, TopicPair};
use crate::error::{ShutdownError, StartupError};
use crate::port::outbound::broker::{Broker, MessageConsumer, MessageProducer};

/// Consume → predict → produce pipeline bound to one prediction capability.
pub struct ModelService {
    gateway: PredictionGateway,
    topics: TopicPair,
    broker: Arc<dyn Broker>,
    provisioner: TopicProvisioner,
    config: ServiceConfig,
    state: ServiceState,
    consumer: Option<Box<dyn MessageConsumer>>,
    producer: Option<Box<dyn MessageProducer>>,
    stats: Arc<ServiceStats>,
    span: Span,
}

impl ModelService {
    /// Create a service in the `Created` state. No I/O happens here.
    #[must_use]
    pub fn new(
        gateway: PredictionGateway,
        broker: Arc<dyn Broker>,
        provisioning: ProvisioningConfig,
        config: ServiceConfig,
    ) -> Self {
        let topics = TopicPair::for_model(gateway.identity());
        let span = info_span!(
            "model_service",
            model = %gateway.name(),
            version = %gateway.identity().version(),
        );
        {
            let _entered = span.enter();
            info!(
                input = topics.input_topic(),
                output = topics.output_topic(),
                broker = broker.name(),
                "Initialized model service"
            );
        }

        Self {
            gateway,
            topics,
            provisioner: TopicProvisioner::new(Arc::clone(&broker), provisioning),
            broker,
            config,
            state: ServiceState::Created,
            consumer: None,
            producer: None,
            stats: Arc::new(ServiceStats::new()),
            span,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &ModelIdentity {
        self.gateway.identity()
    }

    #[must_use]
    pub fn topics(&self) -> &TopicPair {
        &self.topics
    }

    #[must_use]
    pub const fn state(&self) -> ServiceState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Shared counters, updated live while the loop runs.
    #[must_use]
    pub fn stats(&self) -> Arc<ServiceStats> {
        Arc::clone(&self.stats)
    }

    /// Tracing span carrying this service's model and version fields.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Whether a consumer or producer connection is currently held.
    #[must_use]
    pub fn holds_connections(&self) -> bool {
        self.consumer.is_some() || self.producer.is_some()
    }

    /// Provision topics and connect to the broker.
    ///
    /// # Errors
    ///
    /// - [`StartupError::InvalidState`] unless the service is `Created`
    /// - [`StartupError::Provision`] if a topic could not be provisioned
    /// - [`StartupError::Connect`] if the consumer or producer could not
    ///   connect; anything already acquired is released first
    pub async fn start(&mut self) -> Result<(), StartupError> {
        if !self.state.can_start() {
            return Err(StartupError::InvalidState { state: self.state });
        }

        let span = self.span.clone();
        async {
            let report = self.provisioner.ensure(&self.topics).await?;
            info!(
                created = ?report.created,
                existing = ?report.existing,
                "Topics provisioned"
            );

            info!("Starting consumer and producer");
            let mut consumer = self
                .broker
                .consumer(self.topics.input_topic())
                .await
                .map_err(|source| StartupError::Connect {
                    role: "consumer",
                    source,
                })?;

            let producer = match self.broker.producer().await {
                Ok(producer) => producer,
                Err(source) => {
                    if let Err(e) = consumer.close().await {
                        warn!(error = %e, "Failed to release consumer after producer connect failure");
                    }
                    return Err(StartupError::Connect {
                        role: "producer",
                        source,
                    });
                }
            };

            self.consumer = Some(consumer);
            self.producer = Some(producer);
            self.state = ServiceState::Started;
            info!("Model service started");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Release the broker connections and move to `Stopped`.
    ///
    /// Safe to call in any state and any number of times. Release failures
    /// are logged and returned; they never keep the service from stopping.
    pub async fn stop(&mut self) -> Vec<ShutdownError> {
        if self.state.is_stopped() {
            return Vec::new();
        }

        let span = self.span.clone();
        async {
            info!(state = %self.state, "Stopping producer and consumer");
            let mut errors = Vec::new();

            if let Some(mut producer) = self.producer.take() {
                if let Err(e) = producer.close().await {
                    warn!(error = %e, "Failed to close producer");
                    errors.push(ShutdownError::Producer(e));
                }
            }
            if let Some(mut consumer) = self.consumer.take() {
                if let Err(e) = consumer.close().await {
                    warn!(error = %e, "Failed to close consumer");
                    errors.push(ShutdownError::Consumer(e));
                }
            }

            self.state = ServiceState::Stopped;
            let stats = self.stats.snapshot();
            info!(
                received = stats.received,
                published = stats.published,
                failed = stats.failed(),
                "Model service stopped"
            );
            errors
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("identity", self.identity())
            .field("topics", &self.topics)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
