//! Outcome of starting a set of services.

use crate::domain::ModelIdentity;
use crate::error::StartupError;

/// Which services reached `Started` and which did not.
#[derive(Debug, Default)]
pub struct StartupReport {
    pub started: Vec<ModelIdentity>,
    pub failed: Vec<(ModelIdentity, StartupError)>,
}

impl StartupReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.started.len() + self.failed.len()
    }

    #[must_use]
    pub fn all_started(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn none_started(&self) -> bool {
        self.started.is_empty()
    }
}
