//! Modelbus - message-bus driven model inference services.
//!
//! Each configured model gets a service that consumes JSON inputs from its
//! own input topic, runs the model, and publishes the JSON prediction to its
//! own output topic. Topic names are derived from the model's name and
//! version: `model_server.<name>.<major>.<minor>.inputs` / `.outputs`.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Model identities, topic naming, envelopes, service states
//! - [`port`] - Traits for the broker and the prediction capability
//! - [`application`] - Topic provisioning, the per-model processing loop and
//!   the orchestrator that runs many loops concurrently
//! - [`adapter`] - Kafka broker (`kafka` feature), built-in predictors, CLI
//! - [`infrastructure`] - Configuration and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `kafka` - Kafka broker adapter backed by librdkafka
//! - `testkit` - In-memory broker and scripted predictors for tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use modelbus::adapter::outbound::predictor::IdentityPredictor;
//! use modelbus::application::{
//!     ModelService, PredictionGateway, ProvisioningConfig, ServiceConfig, ServiceOrchestrator,
//!     StartupConfig,
//! };
//! use modelbus::port::Broker;
//!
//! async fn serve(broker: Arc<dyn Broker>) -> modelbus::error::Result<()> {
//!     let gateway = PredictionGateway::new(Arc::new(IdentityPredictor::new("echo", 1, 0)))
//!         .map_err(modelbus::error::ConfigError::from)?;
//!     let service = ModelService::new(
//!         gateway,
//!         broker,
//!         ProvisioningConfig::default(),
//!         ServiceConfig::default(),
//!     );
//!
//!     let (_tx, rx) = tokio::sync::watch::channel(false);
//!     let mut orchestrator = ServiceOrchestrator::new(vec![service], StartupConfig::default());
//!     orchestrator.run(rx).await
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
