//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`broker`]: [`MemoryBroker`](broker::MemoryBroker), an in-memory broker
//!   with failure injection.
//! - [`predictor`]: [`FnPredictor`](predictor::FnPredictor), a closure-backed
//!   predictor.

pub mod broker;
pub mod predictor;

use std::sync::Arc;

use crate::application::{ModelService, PredictionGateway, ProvisioningConfig, ServiceConfig};
use crate::port::outbound::predictor::Predictor;

/// Build a `Created` service over `broker` with default settings.
///
/// # Panics
///
/// If the predictor's identity is invalid.
pub fn service(
    broker: &broker::MemoryBroker,
    predictor: impl Predictor + 'static,
    config: ServiceConfig,
) -> ModelService {
    let gateway = PredictionGateway::new(Arc::new(predictor)).expect("valid predictor identity");
    ModelService::new(
        gateway,
        Arc::new(broker.clone()),
        ProvisioningConfig::default(),
        config,
    )
}
