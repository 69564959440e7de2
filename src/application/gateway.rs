//! Uniform call interface over a prediction capability.

use std::sync::Arc;

use anyhow::anyhow;
use serde_json::Value;

use crate::domain::error::IdentityError;
use crate::domain::ModelIdentity;
use crate::port::outbound::predictor::Predictor;

/// Wraps a [`Predictor`] and caches its validated identity.
///
/// The gateway adds no retries: errors from the capability are returned
/// exactly as raised.
#[derive(Clone)]
pub struct PredictionGateway {
    predictor: Arc<dyn Predictor>,
    identity: ModelIdentity,
}

impl PredictionGateway {
    /// Bind a gateway to `predictor`.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the predictor's name is not usable in
    /// a topic name.
    pub fn new(predictor: Arc<dyn Predictor>) -> Result<Self, IdentityError> {
        let identity = predictor.identity()?;
        Ok(Self {
            predictor,
            identity,
        })
    }

    #[must_use]
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    #[must_use]
    pub const fn major_version(&self) -> u32 {
        self.identity.major_version()
    }

    #[must_use]
    pub const fn minor_version(&self) -> u32 {
        self.identity.minor_version()
    }

    /// Run the capability on the calling thread.
    ///
    /// # Errors
    ///
    /// Whatever the capability raised.
    pub fn predict(&self, input: Value) -> anyhow::Result<Value> {
        self.predictor.predict(input)
    }

    /// Run the capability on tokio's blocking pool.
    ///
    /// Keeps slow models from stalling the async workers that drive the
    /// other services. A panic inside the capability is reported as an
    /// error for this input only.
    ///
    /// # Errors
    ///
    /// Whatever the capability raised, or a description of its panic.
    pub async fn predict_isolated(&self, input: Value) -> anyhow::Result<Value> {
        let predictor = Arc::clone(&self.predictor);
        match tokio::task::spawn_blocking(move || predictor.predict(input)).await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                Err(anyhow!("predictor panicked: {}", panic_message(join_error)))
            }
            Err(join_error) => Err(anyhow!("prediction task cancelled: {join_error}")),
        }
    }
}

impl std::fmt::Debug for PredictionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionGateway")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    let payload = join_error.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
