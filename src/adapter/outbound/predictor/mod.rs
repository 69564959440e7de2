//! Predictor adapters and the registry that resolves `[[models]]` entries.
//!
//! Each entry names a predictor `kind`; the [`PredictorRegistry`] maps kinds
//! to factories and is consulted once, at configuration time. Library users
//! can register their own kinds or skip the registry and hand services an
//! `Arc<dyn Predictor>` directly.

pub mod identity;
pub mod process;
pub mod settings;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use identity::IdentityPredictor;
pub use process::ProcessPredictor;
pub use settings::ModelEntry;

use crate::error::ConfigError;
use crate::port::outbound::predictor::Predictor;

/// Builds a predictor for one model entry.
pub type PredictorFactory =
    Box<dyn Fn(&ModelEntry) -> Result<Arc<dyn Predictor>, ConfigError> + Send + Sync>;

/// Predictor kinds available to configuration.
pub struct PredictorRegistry {
    factories: BTreeMap<String, PredictorFactory>,
}

impl PredictorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with the `identity` and `process` kinds.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(identity::KIND, |entry| {
            Ok(Arc::new(IdentityPredictor::new(
                &entry.name,
                entry.major_version,
                entry.minor_version,
            )))
        });
        registry.register(process::KIND, |entry| {
            let (program, args) = entry.program().ok_or_else(|| ConfigError::InvalidValue {
                field: "models.command",
                reason: format!("model '{}' needs a non-empty command", entry.name),
            })?;
            let predictor = ProcessPredictor::spawn(
                &entry.name,
                entry.major_version,
                entry.minor_version,
                program,
                args.to_vec(),
            )
            .map_err(|e| ConfigError::PredictorSetup {
                model: entry.name.clone(),
                reason: format!("cannot start '{program}': {e}"),
            })?;
            Ok(Arc::new(predictor))
        });
        registry
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ModelEntry) -> Result<Arc<dyn Predictor>, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Check that `entry` names a registered kind, without building anything.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownPredictor`] for an unregistered kind.
    pub fn check(&self, entry: &ModelEntry) -> Result<(), ConfigError> {
        if self.contains(&entry.kind) {
            Ok(())
        } else {
            Err(ConfigError::UnknownPredictor {
                kind: entry.kind.clone(),
                model: entry.name.clone(),
            })
        }
    }

    /// Build the predictor for `entry`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownPredictor`] for an unregistered kind
    /// - whatever the kind's factory reports
    /// - [`ConfigError::InvalidValue`] if the predictor reports an identity
    ///   other than the configured one
    pub fn resolve(&self, entry: &ModelEntry) -> Result<Arc<dyn Predictor>, ConfigError> {
        let factory = self
            .factories
            .get(&entry.kind)
            .ok_or_else(|| ConfigError::UnknownPredictor {
                kind: entry.kind.clone(),
                model: entry.name.clone(),
            })?;
        let predictor = factory(entry)?;

        let expected = entry.identity()?;
        let actual = predictor.identity()?;
        if actual != expected {
            return Err(ConfigError::InvalidValue {
                field: "models",
                reason: format!("kind '{}' built {actual}, expected {expected}", entry.kind),
            });
        }
        Ok(predictor)
    }
}

impl Default for PredictorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for PredictorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}
