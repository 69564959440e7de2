//! Broker port for topic administration, consumption and publication.
//!
//! A [`Broker`] hands out fresh client handles; each model service acquires
//! its own admin, consumer and producer so no connection is shared between
//! services.
//!
//! # Cancellation
//!
//! [`MessageConsumer::recv`] is raced against the shutdown signal inside the
//! processing loop, so implementations must be cancel-safe: dropping the
//! future before it resolves must not lose a message.

use async_trait::async_trait;

use crate::domain::{Envelope, TopicSpec};
use crate::error::BrokerError;

/// Topic administration.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    /// Create a topic.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::TopicAlreadyExists`] if the topic is already
    /// present, or another [`BrokerError`] if the request failed.
    async fn create_topic(&self, spec: &TopicSpec) -> Result<(), BrokerError>;
}

/// Consumer bound to a single input topic.
#[async_trait]
pub trait MessageConsumer: Send {
    /// Wait for the next message.
    ///
    /// Returns `Ok(None)` once the stream is closed for good. An `Err` is a
    /// transient receive failure; callers may keep polling.
    async fn recv(&mut self) -> Result<Option<Envelope>, BrokerError>;

    /// Mark `envelope` (and everything before it) as consumed.
    async fn commit(&mut self, envelope: &Envelope) -> Result<(), BrokerError>;

    /// Leave the consumer group and release the connection.
    async fn close(&mut self) -> Result<(), BrokerError>;
}

/// Producer used to publish predictions.
#[async_trait]
pub trait MessageProducer: Send {
    /// Publish `payload` to `topic` and wait for the broker acknowledgment.
    async fn send(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Flush pending messages and release the connection.
    async fn close(&mut self) -> Result<(), BrokerError>;
}

/// Factory for broker client handles.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Broker implementation name for logging.
    fn name(&self) -> &'static str;

    /// Acquire an admin client.
    async fn admin(&self) -> Result<Box<dyn TopicAdmin>, BrokerError>;

    /// Acquire a consumer subscribed to `topic`.
    async fn consumer(&self, topic: &str) -> Result<Box<dyn MessageConsumer>, BrokerError>;

    /// Acquire a producer.
    async fn producer(&self) -> Result<Box<dyn MessageProducer>, BrokerError>;
}
