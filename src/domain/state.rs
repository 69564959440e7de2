//! Lifecycle states of a model service.

use std::fmt;

/// Lifecycle state of a model service.
///
/// ```text
/// Created ──start──▶ Started ──process──▶ Processing
///    │                  │                     │
///    └──────stop────────┴────────stop─────────┴──▶ Stopped
/// ```
///
/// A failed `start` leaves the service in `Created` so it can be retried.
/// `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceState {
    Created,
    Started,
    Processing,
    Stopped,
}

impl ServiceState {
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Created)
    }

    #[must_use]
    pub const fn can_process(self) -> bool {
        matches!(self, Self::Started)
    }

    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_created_can_start() {
        assert!(ServiceState::Created.can_start());
        assert!(!ServiceState::Started.can_start());
        assert!(!ServiceState::Processing.can_start());
        assert!(!ServiceState::Stopped.can_start());
    }

    #[test]
    fn only_started_can_process() {
        assert!(ServiceState::Started.can_process());
        assert!(!ServiceState::Created.can_process());
        assert!(!ServiceState::Processing.can_process());
        assert!(!ServiceState::Stopped.can_process());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(ServiceState::Processing.to_string(), "processing");
    }
}
