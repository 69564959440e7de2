//! Application services (use cases).
//!
//! These services drive the domain types through the outbound ports:
//! provisioning topics, invoking predictors, running the per-model
//! processing loop and coordinating many of those loops at once.

pub mod gateway;
pub mod orchestration;
pub mod provision;
pub mod service;

pub use gateway::PredictionGateway;
pub use orchestration::{ServiceOrchestrator, StartupConfig, StartupPolicy, StartupReport};
pub use provision::{ProvisionReport, ProvisioningConfig, TopicProvisioner};
pub use service::{DeliveryPolicy, ModelService, ServiceConfig, ServiceStats, StatsSnapshot};
