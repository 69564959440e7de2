//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::kafka::settings::BrokerConfig;
use crate::adapter::outbound::predictor::PredictorRegistry;
use crate::application::gateway::PredictionGateway;
use crate::application::orchestration::ServiceOrchestrator;
use crate::application::service::ModelService;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::broker::Broker;

/// Build the broker client for the configured address.
///
/// # Errors
///
/// Returns a configuration error when this build has no broker client
/// (the `kafka` feature is off).
#[cfg(feature = "kafka")]
pub fn build_broker(config: &BrokerConfig) -> Result<Arc<dyn Broker>> {
    use crate::adapter::outbound::kafka::KafkaBroker;

    info!(address = %config.address, group_id = %config.group_id, "Using Kafka broker");
    Ok(Arc::new(KafkaBroker::new(config.clone())))
}

/// Build the broker client for the configured address.
///
/// # Errors
///
/// Always: this build has no broker client (the `kafka` feature is off).
#[cfg(not(feature = "kafka"))]
pub fn build_broker(_config: &BrokerConfig) -> Result<Arc<dyn Broker>> {
    Err(ConfigError::InvalidValue {
        field: "broker",
        reason: "this build has no Kafka support; rebuild with `--features kafka`".to_string(),
    }
    .into())
}

/// Resolve every configured model to a service bound to `broker`.
///
/// # Errors
///
/// Returns the first model whose predictor could not be resolved.
pub fn build_services(
    config: &Config,
    registry: &PredictorRegistry,
    broker: &Arc<dyn Broker>,
) -> Result<Vec<ModelService>> {
    let mut services = Vec::with_capacity(config.models.len());
    for entry in &config.models {
        let predictor = registry.resolve(entry)?;
        let gateway = PredictionGateway::new(predictor).map_err(ConfigError::from)?;
        info!(model = %gateway.identity(), kind = %entry.kind, "Resolved predictor");
        services.push(ModelService::new(
            gateway,
            Arc::clone(broker),
            config.provisioning,
            config.service.clone(),
        ));
    }
    Ok(services)
}

/// Wire configured models into an orchestrator over `broker`.
///
/// # Errors
///
/// Returns the first model whose predictor could not be resolved.
pub fn build_orchestrator(
    config: &Config,
    registry: &PredictorRegistry,
    broker: Arc<dyn Broker>,
) -> Result<ServiceOrchestrator> {
    let services = build_services(config, registry, &broker)?;
    Ok(ServiceOrchestrator::new(services, config.startup.clone()))
}
