//! Per-service processing counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::MessageError;

/// Lock-free counters updated by the processing loop.
///
/// Shared behind an `Arc` so callers can observe a service while its loop
/// runs on another task.
#[derive(Debug, Default)]
pub struct ServiceStats {
    received: AtomicU64,
    published: AtomicU64,
    decode_failures: AtomicU64,
    prediction_failures: AtomicU64,
    publish_failures: AtomicU64,
    commit_failures: AtomicU64,
    receive_errors: AtomicU64,
}

/// Point-in-time copy of [`ServiceStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub published: u64,
    pub decode_failures: u64,
    pub prediction_failures: u64,
    pub publish_failures: u64,
    pub commit_failures: u64,
    pub receive_errors: u64,
}

impl StatsSnapshot {
    /// Messages whose handling failed for any reason.
    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.decode_failures + self.prediction_failures + self.publish_failures
    }

    /// Messages whose handling has finished, successfully or not.
    #[must_use]
    pub const fn handled(&self) -> u64 {
        self.published + self.failed()
    }
}

impl ServiceStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, error: &MessageError) {
        let counter = match error {
            MessageError::Decode { .. } => &self.decode_failures,
            MessageError::Prediction(_) => &self.prediction_failures,
            MessageError::Encode(_) | MessageError::Publish(_) => &self.publish_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// An in-flight message abandoned at shutdown never got published.
    pub(crate) fn record_abandoned(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit_failure(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            prediction_failures: self.prediction_failures.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }
}
