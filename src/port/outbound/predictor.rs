//! Prediction capability port.
//!
//! A [`Predictor`] is the model a service serves: an opaque callable with a
//! name and a two-part version. Predictors are resolved once at
//! configuration time and injected into services as `Arc<dyn Predictor>`.

use serde_json::Value;

use crate::domain::error::IdentityError;
use crate::domain::ModelIdentity;

/// A versioned prediction capability.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; `predict` is invoked from tokio's
/// blocking pool.
///
/// # Implementation Notes
///
/// - `predict` may be slow, but must not perform broker I/O or retry on its
///   own
/// - Errors are passed through to the caller as-is
pub trait Predictor: Send + Sync {
    /// Model name, embedded in topic names.
    fn name(&self) -> &str;

    fn major_version(&self) -> u32;

    fn minor_version(&self) -> u32;

    /// Run inference on one decoded input.
    ///
    /// # Errors
    ///
    /// Any failure raised by the underlying model.
    fn predict(&self, input: Value) -> anyhow::Result<Value>;

    /// Validated identity of this predictor.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the name cannot be used in a topic name.
    fn identity(&self) -> Result<ModelIdentity, IdentityError> {
        ModelIdentity::try_new(self.name(), self.major_version(), self.minor_version())
    }
}
