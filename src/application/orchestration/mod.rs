//! Multi-service coordination.
//!
//! The [`ServiceOrchestrator`] owns every [`ModelService`] and drives them
//! through their lifecycle together:
//!
//! 1. **Start**: every service starts concurrently, with retries
//! 2. **Run**: one tokio task per started service runs its processing loop
//! 3. **Shutdown**: every service is stopped, failures are logged
//!
//! [`ModelService`]: crate::application::service::ModelService

mod config;
mod orchestrator;
mod report;

pub use config::{StartupConfig, StartupPolicy};
pub use orchestrator::ServiceOrchestrator;
pub use report::StartupReport;
