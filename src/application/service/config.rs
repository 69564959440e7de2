//! Model service configuration.

use std::time::Duration;

use serde::Deserialize;

/// When a consumed message's offset is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Commit as soon as the message is fetched, before it is processed.
    /// A crash mid-message loses that message.
    #[default]
    AtMostOnce,
    /// Commit once handling finished, successfully or not. A crash
    /// mid-message redelivers it on restart.
    AfterProcessing,
}

/// Per-service processing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Offset commit policy.
    #[serde(default)]
    pub delivery: DeliveryPolicy,
    /// How long an in-flight message may keep running after cancellation.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl ServiceConfig {
    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryPolicy::default(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

const fn default_drain_timeout_ms() -> u64 {
    5_000
}
