//! `[[models]]` entries.

use serde::Deserialize;

use crate::domain::ModelIdentity;
use crate::error::ConfigError;

/// One model to serve: which predictor kind backs it and under which
/// identity it is published.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelEntry {
    /// Predictor kind, looked up in the [`PredictorRegistry`](super::PredictorRegistry).
    pub kind: String,
    pub name: String,
    pub major_version: u32,
    pub minor_version: u32,
    /// Program and arguments for `process` predictors.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl ModelEntry {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the name is not usable in a topic name.
    pub fn identity(&self) -> Result<ModelIdentity, ConfigError> {
        Ok(ModelIdentity::try_new(
            &self.name,
            self.major_version,
            self.minor_version,
        )?)
    }

    /// The configured command, if it names a program.
    #[must_use]
    pub fn program(&self) -> Option<(&str, &[String])> {
        let (program, args) = self.command.as_deref()?.split_first()?;
        (!program.trim().is_empty()).then_some((program.as_str(), args))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.identity()?;
        if self.kind.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "models.kind",
            });
        }
        if self.kind == super::process::KIND && self.program().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "models.command",
                reason: format!("model '{}' needs a non-empty command", self.name),
            });
        }
        Ok(())
    }
}
