//! Handler for `check config`.

use std::path::Path;

use anyhow::Context;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::predictor::PredictorRegistry;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file without connecting to the broker or
/// starting any predictor.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or if a model
/// names a predictor kind this build does not know.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> anyhow::Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    let registry = PredictorRegistry::with_builtins();
    for entry in &config.models {
        registry.check(entry)?;
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration is valid");

    output::section("Summary");
    output::field("Broker", &config.broker.address);
    output::field("Group", &config.broker.group_id);
    output::field("Delivery", format!("{:?}", config.service.delivery));
    output::field("Startup", format!("{:?}", config.startup.policy));
    output::field("Models", config.models.len());

    output::section("Models");
    for entry in &config.models {
        let identity = entry.identity()?;
        output::field(&entry.kind, output::highlight(identity));
    }

    if cfg!(not(feature = "kafka")) {
        output::warning("This build has no Kafka support; `run` needs `--features kafka`");
    }

    Ok(())
}
