//! The consume → predict → produce loop.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};

use super::codec;
use super::config::DeliveryPolicy;
use super::stats::ServiceStats;
use super::ModelService;
use crate::application::gateway::PredictionGateway;
use crate::domain::{Envelope, ServiceState};
use crate::error::{MessageError, ServiceError};
use crate::port::outbound::broker::{MessageConsumer, MessageProducer};

const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_SHIFT: u32 = 6;

impl ModelService {
    /// Run the processing loop until `shutdown` flips to `true` (or its
    /// sender is dropped) or the input stream closes.
    ///
    /// Per-message failures are logged, counted and skipped; they never end
    /// the loop.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidState`] unless the service is `Started`
    /// - [`ServiceError::NotConnected`] if a connection is missing
    pub async fn process(&mut self, shutdown: watch::Receiver<bool>) -> Result<(), ServiceError> {
        if !self.state.can_process() {
            return Err(ServiceError::InvalidState { state: self.state });
        }
        let Some(consumer) = self.consumer.as_mut() else {
            return Err(ServiceError::NotConnected("consumer"));
        };
        let Some(producer) = self.producer.as_mut() else {
            return Err(ServiceError::NotConnected("producer"));
        };
        self.state = ServiceState::Processing;

        let pipeline = Pipeline {
            gateway: &self.gateway,
            output_topic: self.topics.output_topic(),
            consumer,
            producer,
            stats: &self.stats,
            delivery: self.config.delivery,
            drain_timeout: self.config.drain_timeout(),
        };
        pipeline.run(shutdown).instrument(self.span.clone()).await;
        Ok(())
    }
}

/// Borrowed view of a started service, split so the loop can hold the
/// consumer and producer mutably at the same time.
struct Pipeline<'a> {
    gateway: &'a PredictionGateway,
    output_topic: &'a str,
    consumer: &'a mut Box<dyn MessageConsumer>,
    producer: &'a mut Box<dyn MessageProducer>,
    stats: &'a ServiceStats,
    delivery: DeliveryPolicy,
    drain_timeout: Duration,
}

enum Outcome {
    Handled,
    Abandoned,
}

impl Pipeline<'_> {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(delivery = ?self.delivery, "Processing loop started");
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, leaving processing loop");
                break;
            }

            let received = tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => {
                    info!("Shutdown requested, leaving processing loop");
                    break;
                }
                received = self.consumer.recv() => received,
            };

            match received {
                Ok(Some(envelope)) => {
                    consecutive_errors = 0;
                    if let Outcome::Abandoned = self.dispatch(envelope, &shutdown).await {
                        break;
                    }
                }
                Ok(None) => {
                    warn!("Input stream closed, leaving processing loop");
                    break;
                }
                Err(e) => {
                    self.stats.record_receive_error();
                    let delay = backoff(consecutive_errors);
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    warn!(
                        error = %e,
                        consecutive_errors,
                        retry_in_ms = delay.as_millis() as u64,
                        "Failed to receive message"
                    );
                    tokio::select! {
                        biased;
                        () = cancelled(&mut shutdown) => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            received = stats.received,
            published = stats.published,
            failed = stats.failed(),
            "Processing loop finished"
        );
    }

    async fn dispatch(&mut self, envelope: Envelope, shutdown: &watch::Receiver<bool>) -> Outcome {
        self.stats.record_received();
        if self.delivery == DeliveryPolicy::AtMostOnce {
            self.commit(&envelope).await;
        }

        let drain_timeout = self.drain_timeout;
        let result = tokio::select! {
            result = self.handle(&envelope) => Some(result),
            () = drain_deadline(shutdown.clone(), drain_timeout) => None,
        };

        let Some(result) = result else {
            self.stats.record_abandoned();
            warn!(
                offset = ?envelope.offset,
                drain_timeout_ms = drain_timeout.as_millis() as u64,
                "Abandoned in-flight message after drain timeout"
            );
            return Outcome::Abandoned;
        };

        match &result {
            Ok(()) => {
                self.stats.record_published();
                debug!(offset = ?envelope.offset, "Published prediction");
            }
            Err(MessageError::Decode { reason, preview }) => {
                warn!(
                    offset = ?envelope.offset,
                    reason = %reason,
                    preview = %preview,
                    "Skipping message that is not valid JSON"
                );
            }
            Err(MessageError::Prediction(e)) => {
                error!(offset = ?envelope.offset, error = %format!("{e:#}"), "Prediction failed");
            }
            Err(e @ (MessageError::Encode(_) | MessageError::Publish(_))) => {
                error!(
                    offset = ?envelope.offset,
                    kind = e.kind(),
                    error = %e,
                    "Failed to publish prediction"
                );
            }
        }
        if let Err(e) = &result {
            self.stats.record_failure(e);
        }

        if self.delivery == DeliveryPolicy::AfterProcessing {
            self.commit(&envelope).await;
        }
        Outcome::Handled
    }

    async fn handle(&mut self, envelope: &Envelope) -> Result<(), MessageError> {
        let input = codec::decode(envelope)?;
        let prediction = self
            .gateway
            .predict_isolated(input)
            .await
            .map_err(MessageError::Prediction)?;
        let bytes = codec::encode(&prediction)?;
        self.producer
            .send(self.output_topic, &bytes)
            .await
            .map_err(MessageError::Publish)
    }

    async fn commit(&mut self, envelope: &Envelope) {
        if let Err(e) = self.consumer.commit(envelope).await {
            self.stats.record_commit_failure();
            warn!(offset = ?envelope.offset, error = %e, "Failed to commit offset");
        }
    }
}

/// Resolves once shutdown has been requested or the sender is gone.
pub(crate) async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Resolves `timeout` after shutdown has been requested.
async fn drain_deadline(mut shutdown: watch::Receiver<bool>, timeout: Duration) {
    cancelled(&mut shutdown).await;
    tokio::time::sleep(timeout).await;
}

/// Delay before retrying after `consecutive` failed receives.
fn backoff(consecutive: u32) -> Duration {
    Duration::from_millis(BASE_BACKOFF_MS << consecutive.min(MAX_BACKOFF_SHIFT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(backoff(0), Duration::from_millis(100));
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(3), Duration::from_millis(800));
        assert_eq!(backoff(6), Duration::from_millis(6400));
        assert_eq!(backoff(50), Duration::from_millis(6400));
    }

    #[tokio::test]
    async fn cancelled_resolves_when_sender_dropped() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), cancelled(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_on_flag() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { cancelled(&mut rx).await });
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn drain_deadline_waits_for_shutdown_then_timeout() {
        let (tx, rx) = watch::channel(false);
        let deadline = tokio::spawn(drain_deadline(rx, Duration::from_millis(500)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!deadline.is_finished());

        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(deadline.is_finished());
    }
}
