//! Startup settings for the orchestrator.

use std::time::Duration;

use serde::Deserialize;

/// How partial startup failure is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPolicy {
    /// Run whatever started; fail only when nothing did.
    #[default]
    BestEffort,
    /// Fail when any service could not start.
    FailFast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartupConfig {
    #[serde(default)]
    pub policy: StartupPolicy,
    /// Attempts per service, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl StartupConfig {
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            policy: StartupPolicy::default(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1_000
}
