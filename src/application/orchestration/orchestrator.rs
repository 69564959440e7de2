//! Owns the model services and coordinates their lifecycle.

use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};

use super::config::{StartupConfig, StartupPolicy};
use super::report::StartupReport;
use crate::application::service::{cancelled, ModelService};
use crate::domain::{ModelIdentity, ServiceState};
use crate::error::{Error, Result, ServiceError, ShutdownError, StartupError};

type ProcessTask = JoinHandle<(ModelService, std::result::Result<(), ServiceError>)>;

/// Starts, runs and stops a set of [`ModelService`]s.
///
/// A failure in one service never takes down its siblings: startup
/// failures are collected into a [`StartupReport`], processing loops run on
/// independent tasks, and release failures at shutdown are only logged.
pub struct ServiceOrchestrator {
    services: Vec<ModelService>,
    config: StartupConfig,
}

impl ServiceOrchestrator {
    #[must_use]
    pub fn new(services: Vec<ModelService>, config: StartupConfig) -> Self {
        Self { services, config }
    }

    #[must_use]
    pub fn services(&self) -> &[ModelService] {
        &self.services
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Start every service concurrently, retrying each per the startup
    /// settings.
    ///
    /// Once `shutdown` fires, attempts in flight are abandoned and no retry
    /// is scheduled; the affected services report
    /// [`StartupError::Cancelled`].
    ///
    /// # Errors
    ///
    /// [`Error::StartupFailed`] when no service started, or under
    /// [`StartupPolicy::FailFast`] when any service failed. Services that did
    /// start stay `Started` either way; call [`Self::shutdown_all`] to
    /// release them.
    pub async fn start_all(&mut self, shutdown: &watch::Receiver<bool>) -> Result<StartupReport> {
        let max_attempts = self.config.max_attempts.max(1);
        let retry_delay = self.config.retry_delay();

        let results = join_all(self.services.iter_mut().map(|service| {
            start_with_retry(service, max_attempts, retry_delay, shutdown.clone())
        }))
        .await;

        let mut report = StartupReport::default();
        for (service, result) in self.services.iter().zip(results) {
            match result {
                Ok(()) => report.started.push(service.identity().clone()),
                Err(e) => report.failed.push((service.identity().clone(), e)),
            }
        }

        info!(
            started = report.started.len(),
            failed = report.failed.len(),
            total = report.total(),
            "Startup complete"
        );

        let failed = report.failed.len();
        let total = report.total();
        let rejected = match self.config.policy {
            StartupPolicy::BestEffort => total > 0 && report.none_started(),
            StartupPolicy::FailFast => !report.all_started(),
        };
        if rejected {
            return Err(Error::StartupFailed { failed, total });
        }
        Ok(report)
    }

    /// Run every started service's processing loop on its own task until
    /// all of them return.
    ///
    /// Services that are not `Started` are left alone. A task that panics
    /// is logged and its service dropped, which releases its connections.
    pub async fn run_all(&mut self, shutdown: watch::Receiver<bool>) {
        let mut idle = Vec::new();
        let mut tasks: Vec<(usize, ModelIdentity, ProcessTask)> = Vec::new();

        for (index, mut service) in std::mem::take(&mut self.services).into_iter().enumerate() {
            if service.state() != ServiceState::Started {
                idle.push((index, service));
                continue;
            }
            let identity = service.identity().clone();
            let shutdown = shutdown.clone();
            let handle = tokio::spawn(async move {
                let result = service.process(shutdown).await;
                (service, result)
            });
            tasks.push((index, identity, handle));
        }

        info!(running = tasks.len(), idle = idle.len(), "Model services running");

        let mut returned = idle;
        for (index, identity, handle) in tasks {
            match handle.await {
                Ok((service, Ok(()))) => returned.push((index, service)),
                Ok((service, Err(e))) => {
                    error!(model = %identity, error = %e, "Processing loop could not run");
                    returned.push((index, service));
                }
                Err(e) => {
                    error!(model = %identity, error = %e, "Model service task failed, service dropped");
                }
            }
        }

        returned.sort_by_key(|(index, _)| *index);
        self.services = returned.into_iter().map(|(_, service)| service).collect();
    }

    /// Stop every service, logging release failures and per-service
    /// statistics. Never fails.
    pub async fn shutdown_all(&mut self) -> Vec<(ModelIdentity, ShutdownError)> {
        let results = join_all(self.services.iter_mut().map(|service| service.stop())).await;

        let mut failures = Vec::new();
        for (service, errors) in self.services.iter().zip(results) {
            let stats = service.stats().snapshot();
            info!(
                model = %service.identity(),
                received = stats.received,
                published = stats.published,
                decode_failures = stats.decode_failures,
                prediction_failures = stats.prediction_failures,
                publish_failures = stats.publish_failures,
                commit_failures = stats.commit_failures,
                receive_errors = stats.receive_errors,
                "Model service statistics"
            );
            for e in errors {
                warn!(model = %service.identity(), error = %e, "Release failed during shutdown");
                failures.push((service.identity().clone(), e));
            }
        }

        info!(services = self.services.len(), "All model services stopped");
        failures
    }

    /// Start everything, run until `shutdown`, then stop everything.
    ///
    /// Shutdown runs on every exit path, including startup failure. A
    /// shutdown requested before startup finished skips processing and
    /// returns `Ok`.
    ///
    /// # Errors
    ///
    /// The startup error from [`Self::start_all`].
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let startup = self.start_all(&shutdown).await;

        if shutdown_requested(&shutdown) {
            info!("Shutdown requested during startup, skipping processing");
            self.shutdown_all().await;
            return Ok(());
        }
        if let Err(e) = startup {
            error!(error = %e, "Startup failed, shutting down");
            self.shutdown_all().await;
            return Err(e);
        }

        self.run_all(shutdown).await;
        self.shutdown_all().await;
        Ok(())
    }
}

impl std::fmt::Debug for ServiceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceOrchestrator")
            .field("services", &self.services)
            .field("config", &self.config)
            .finish()
    }
}

async fn start_with_retry(
    service: &mut ModelService,
    max_attempts: u32,
    retry_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> std::result::Result<(), StartupError> {
    let span = service.span().clone();
    async move {
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => Err(StartupError::Cancelled),
                result = service.start() => result,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(StartupError::Cancelled) => {
                    info!(attempt, "Startup cancelled");
                    return Err(StartupError::Cancelled);
                }
                Err(e @ StartupError::InvalidState { .. }) => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    error!(attempt, error = %e, "Model service failed to start");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts,
                        retry_in_ms = retry_delay.as_millis() as u64,
                        error = %e,
                        "Model service start failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        () = cancelled(&mut shutdown) => {
                            info!(attempt, "Startup cancelled");
                            return Err(StartupError::Cancelled);
                        }
                        () = tokio::time::sleep(retry_delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }
    .instrument(span)
    .await
}

fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::gateway::PredictionGateway;
    use crate::application::provision::ProvisioningConfig;
    use crate::application::service::ServiceConfig;
    use crate::error::BrokerError;
    use crate::testkit::broker::MemoryBroker;
    use crate::testkit::predictor::FnPredictor;

    fn service(broker: &MemoryBroker, name: &str) -> ModelService {
        let gateway =
            PredictionGateway::new(Arc::new(FnPredictor::identity(name, 1, 0))).unwrap();
        ModelService::new(
            gateway,
            Arc::new(broker.clone()),
            ProvisioningConfig::default(),
            ServiceConfig::default(),
        )
    }

    fn quick_startup(policy: StartupPolicy, max_attempts: u32) -> StartupConfig {
        StartupConfig {
            policy,
            max_attempts,
            retry_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn start_all_retries_transient_failures() {
        let broker = MemoryBroker::new();
        broker.fail_next_consumer(BrokerError::Connection("not yet".into()));
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a")],
            quick_startup(StartupPolicy::BestEffort, 2),
        );
        let (_tx, rx) = watch::channel(false);

        let report = orchestrator.start_all(&rx).await.unwrap();

        assert_eq!(report.started.len(), 1);
        assert!(report.all_started());
    }

    #[tokio::test]
    async fn best_effort_fails_only_when_nothing_started() {
        let broker = MemoryBroker::new();
        broker.fail_admin(BrokerError::Connection("down".into()));
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a"), service(&broker, "b")],
            quick_startup(StartupPolicy::BestEffort, 1),
        );
        let (_tx, rx) = watch::channel(false);

        let err = orchestrator.start_all(&rx).await.unwrap_err();
        assert!(matches!(err, Error::StartupFailed { failed: 2, total: 2 }));
        assert!(orchestrator.shutdown_all().await.is_empty());
    }

    #[tokio::test]
    async fn fail_fast_rejects_partial_startup() {
        let broker = MemoryBroker::new();
        broker.fail_next_producer(BrokerError::Connection("refused".into()));
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a"), service(&broker, "b")],
            quick_startup(StartupPolicy::FailFast, 1),
        );
        let (_tx, rx) = watch::channel(false);

        let err = orchestrator.start_all(&rx).await.unwrap_err();
        assert!(matches!(err, Error::StartupFailed { failed: 1, total: 2 }));

        orchestrator.shutdown_all().await;
        assert_eq!(broker.open_consumers(), 0);
        assert_eq!(broker.open_producers(), 0);
    }

    #[tokio::test]
    async fn run_all_returns_services_in_order() {
        let broker = MemoryBroker::new();
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a"), service(&broker, "b"), service(&broker, "c")],
            StartupConfig::default(),
        );
        let (tx, rx) = watch::channel(false);
        orchestrator.start_all(&rx).await.unwrap();

        tx.send(true).unwrap();
        orchestrator.run_all(rx).await;

        let names: Vec<_> = orchestrator
            .services()
            .iter()
            .map(|s| s.identity().name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(orchestrator
            .services()
            .iter()
            .all(|s| s.state() == ServiceState::Processing));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_retry_delay() {
        let broker = MemoryBroker::new();
        broker.fail_admin(BrokerError::Connection("down".into()));
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a")],
            StartupConfig {
                policy: StartupPolicy::BestEffort,
                max_attempts: 5,
                retry_delay_ms: 60_000,
            },
        );
        let (tx, rx) = watch::channel(false);

        let started = tokio::time::Instant::now();
        let startup = orchestrator.start_all(&rx);
        tokio::pin!(startup);
        tokio::select! {
            _ = &mut startup => panic!("startup finished before shutdown"),
            () = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
        tx.send(true).unwrap();
        let err = startup.await.unwrap_err();

        assert!(matches!(err, Error::StartupFailed { failed: 1, total: 1 }));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cancelled_startup_reports_cancellation() {
        let broker = MemoryBroker::new();
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a"), service(&broker, "b")],
            StartupConfig::default(),
        );
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let err = orchestrator.start_all(&rx).await.unwrap_err();

        assert!(matches!(err, Error::StartupFailed { failed: 2, total: 2 }));
        assert!(orchestrator
            .services()
            .iter()
            .all(|s| s.state() == ServiceState::Created));
        assert_eq!(broker.open_consumers(), 0);
    }

    #[tokio::test]
    async fn run_returns_ok_when_shutdown_precedes_startup() {
        let broker = MemoryBroker::new();
        broker.fail_admin(BrokerError::Connection("down".into()));
        let mut orchestrator = ServiceOrchestrator::new(
            vec![service(&broker, "a")],
            StartupConfig {
                policy: StartupPolicy::FailFast,
                max_attempts: 3,
                retry_delay_ms: 2_000,
            },
        );
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let started = std::time::Instant::now();
        orchestrator.run(rx).await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(orchestrator
            .services()
            .iter()
            .all(|s| s.state() == ServiceState::Stopped));
    }
}
