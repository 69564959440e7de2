#![allow(dead_code)]

pub mod architecture;

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use modelbus::application::{ModelService, ServiceConfig};
use modelbus::error::ServiceError;
use modelbus::testkit::broker::MemoryBroker;
use modelbus::testkit::predictor::FnPredictor;

/// Upper bound for anything a test waits on.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Input topic for `name` at version 1.0.
pub fn input_topic(name: &str) -> String {
    format!("model_server.{name}.1.0.inputs")
}

/// Output topic for `name` at version 1.0.
pub fn output_topic(name: &str) -> String {
    format!("model_server.{name}.1.0.outputs")
}

/// A started service for `predictor` over `broker`.
pub async fn started(
    broker: &MemoryBroker,
    predictor: FnPredictor,
    config: ServiceConfig,
) -> ModelService {
    let mut service = modelbus::testkit::service(broker, predictor, config);
    service.start().await.expect("service starts");
    service
}

/// Run `service.process` on its own task, handing the service back when the
/// loop ends.
pub fn spawn_process(
    mut service: ModelService,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<(ModelService, Result<(), ServiceError>)> {
    tokio::spawn(async move {
        let result = service.process(shutdown).await;
        (service, result)
    })
}

/// Wait for a spawned loop to finish within [`TIMEOUT`].
pub async fn join(
    handle: JoinHandle<(ModelService, Result<(), ServiceError>)>,
) -> (ModelService, Result<(), ServiceError>) {
    tokio::time::timeout(TIMEOUT, handle)
        .await
        .expect("processing loop finished in time")
        .expect("processing task did not panic")
}
