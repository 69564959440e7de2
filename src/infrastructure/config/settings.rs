//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; a few values can be overridden
//! from the environment:
//!
//! - `MODELBUS_BROKER`: broker bootstrap address
//! - `MODELBUS_LOG_LEVEL`: log level
//!
//! # Example
//!
//! ```no_run
//! use modelbus::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("modelbus.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::adapter::outbound::kafka::settings::BrokerConfig;
use crate::adapter::outbound::predictor::settings::ModelEntry;
use crate::application::orchestration::StartupConfig;
use crate::application::provision::ProvisioningConfig;
use crate::application::service::ServiceConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `broker.address`.
pub const BROKER_ENV: &str = "MODELBUS_BROKER";
/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV: &str = "MODELBUS_LOG_LEVEL";

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Broker connection settings.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Layout of provisioned topics.
    #[serde(default)]
    pub provisioning: ProvisioningConfig,

    /// Startup retries and partial-failure policy.
    #[serde(default)]
    pub startup: StartupConfig,

    /// Per-service processing settings, shared by every model.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Models to serve, one service each.
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

impl Config {
    /// Parse configuration from TOML content, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Like [`Config::parse_toml`], reading overrides through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn parse_toml_with_env<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = env(BROKER_ENV).filter(|v| !v.trim().is_empty()) {
            self.broker.address = address;
        }
        if let Some(level) = env(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    fn validate(&self) -> Result<()> {
        if self.broker.address.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "broker.address",
            }
            .into());
        }
        if self.broker.group_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "broker.group_id",
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        self.logging.validate()?;

        if self.provisioning.partitions < 1 {
            return Err(ConfigError::InvalidValue {
                field: "provisioning.partitions",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.provisioning.replication_factor < 1 {
            return Err(ConfigError::InvalidValue {
                field: "provisioning.replication_factor",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.startup.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "startup.max_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.service.drain_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "service.drain_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.models.is_empty() {
            return Err(ConfigError::MissingField { field: "models" }.into());
        }
        let mut seen = HashSet::new();
        for entry in &self.models {
            entry.validate()?;
            let identity = entry.identity()?;
            if !seen.insert(identity.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: "models",
                    reason: format!("model {identity} is configured more than once"),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::kafka::settings::{OffsetReset, DEFAULT_GROUP_ID};
    use crate::application::orchestration::StartupPolicy;
    use crate::application::service::DeliveryPolicy;
    use crate::error::Error;

    const MINIMAL: &str = r#"
[broker]
address = "localhost:9092"

[[models]]
kind = "identity"
name = "echo"
major_version = 1
minor_version = 0
"#;

    fn parse(content: &str) -> Result<Config> {
        Config::parse_toml_with_env(content, |_| None)
    }

    fn invalid_field(result: Result<Config>) -> &'static str {
        match result {
            Err(Error::Config(ConfigError::InvalidValue { field, .. }))
            | Err(Error::Config(ConfigError::MissingField { field })) => field,
            other => panic!("expected a field error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse(MINIMAL).unwrap();

        assert_eq!(config.broker.address, "localhost:9092");
        assert_eq!(config.broker.group_id, DEFAULT_GROUP_ID);
        assert_eq!(config.broker.offset_reset, OffsetReset::Latest);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.provisioning, ProvisioningConfig::default());
        assert_eq!(config.startup.policy, StartupPolicy::BestEffort);
        assert_eq!(config.startup.max_attempts, 3);
        assert_eq!(config.service.delivery, DeliveryPolicy::AtMostOnce);
        assert_eq!(config.service.drain_timeout_ms, 5_000);
        assert_eq!(config.models.len(), 1);
    }

    #[test]
    fn full_config_parses() {
        let config = parse(
            r#"
[broker]
address = "kafka-1:9092,kafka-2:9092"
group_id = "inference"
offset_reset = "earliest"

[broker.properties]
"security.protocol" = "SASL_SSL"

[logging]
level = "debug"
format = "json"

[provisioning]
partitions = 3
replication_factor = 2

[startup]
policy = "fail_fast"
max_attempts = 5
retry_delay_ms = 250

[service]
delivery = "after_processing"
drain_timeout_ms = 1000

[[models]]
kind = "identity"
name = "echo"
major_version = 1
minor_version = 0

[[models]]
kind = "process"
name = "image_classification"
major_version = 1
minor_version = 2
command = ["python3", "-m", "image_classification.serve"]
"#,
        )
        .unwrap();

        assert_eq!(config.broker.offset_reset, OffsetReset::Earliest);
        assert_eq!(
            config.broker.properties.get("security.protocol").map(String::as_str),
            Some("SASL_SSL")
        );
        assert_eq!(config.provisioning.partitions, 3);
        assert_eq!(config.startup.policy, StartupPolicy::FailFast);
        assert_eq!(config.service.delivery, DeliveryPolicy::AfterProcessing);
        assert_eq!(config.models[1].program().map(|(p, _)| p), Some("python3"));
    }

    #[test]
    fn env_overrides_broker_and_level() {
        let config = Config::parse_toml_with_env(MINIMAL, |key| match key {
            BROKER_ENV => Some("override:9092".to_string()),
            LOG_LEVEL_ENV => Some("debug".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.broker.address, "override:9092");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn env_can_supply_missing_broker() {
        let without_broker = MINIMAL.replace("address = \"localhost:9092\"", "");
        assert_eq!(invalid_field(parse(&without_broker)), "broker.address");

        let config = Config::parse_toml_with_env(&without_broker, |key| {
            (key == BROKER_ENV).then(|| "env:9092".to_string())
        })
        .unwrap();
        assert_eq!(config.broker.address, "env:9092");
    }

    #[test]
    fn requires_models() {
        let result = parse("[broker]\naddress = \"localhost:9092\"\n");
        assert_eq!(invalid_field(result), "models");
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ("[provisioning]\npartitions = 0", "provisioning.partitions"),
            ("[provisioning]\nreplication_factor = 0", "provisioning.replication_factor"),
            ("[startup]\nmax_attempts = 0", "startup.max_attempts"),
            ("[service]\ndrain_timeout_ms = 0", "service.drain_timeout_ms"),
            ("[logging]\nformat = \"xml\"", "logging.format"),
        ];
        for (section, field) in cases {
            let content = format!("{MINIMAL}\n{section}\n");
            assert_eq!(invalid_field(parse(&content)), field, "{section}");
        }
    }

    #[test]
    fn rejects_duplicate_identities() {
        let content = format!(
            "{MINIMAL}\n[[models]]\nkind = \"identity\"\nname = \"echo\"\nmajor_version = 1\nminor_version = 0\n"
        );
        assert_eq!(invalid_field(parse(&content)), "models");
    }

    #[test]
    fn same_name_different_version_is_allowed() {
        let content = format!(
            "{MINIMAL}\n[[models]]\nkind = \"identity\"\nname = \"echo\"\nmajor_version = 1\nminor_version = 1\n"
        );
        assert_eq!(parse(&content).unwrap().models.len(), 2);
    }

    #[test]
    fn rejects_invalid_model_name() {
        let content = MINIMAL.replace("name = \"echo\"", "name = \"has space\"");
        let err = parse(&content).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Identity(_))));
    }

    #[test]
    fn process_models_need_a_command() {
        let content = MINIMAL.replace("kind = \"identity\"", "kind = \"process\"");
        assert_eq!(invalid_field(parse(&content)), "models.command");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse("[broker\naddress=").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
