//! Scripted [`Predictor`]s for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::port::outbound::predictor::Predictor;

type PredictFn = dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync;

/// A predictor backed by a closure.
///
/// Counts its invocations so tests can assert how often the model ran.
pub struct FnPredictor {
    name: String,
    major_version: u32,
    minor_version: u32,
    predict: Box<PredictFn>,
    calls: Arc<AtomicUsize>,
}

impl FnPredictor {
    pub fn new<F>(name: impl Into<String>, major_version: u32, minor_version: u32, predict: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            major_version,
            minor_version,
            predict: Box::new(predict),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A predictor that returns its input unchanged.
    pub fn identity(name: impl Into<String>, major_version: u32, minor_version: u32) -> Self {
        Self::new(name, major_version, minor_version, |input| Ok(input))
    }

    /// Shared invocation counter.
    #[must_use]
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Predictor for FnPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn major_version(&self) -> u32 {
        self.major_version
    }

    fn minor_version(&self) -> u32 {
        self.minor_version
    }

    fn predict(&self, input: Value) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.predict)(input)
    }
}
