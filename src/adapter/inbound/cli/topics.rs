//! Handler for `topics`.

use std::path::Path;

use anyhow::Context;

use crate::adapter::inbound::cli::output;
use crate::domain::TopicPair;
use crate::infrastructure::config::settings::Config;

/// Print the topic pair derived for every configured model.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn execute<P: AsRef<Path>>(config_path: P) -> anyhow::Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    output::section("Topics");
    for entry in &config.models {
        let identity = entry.identity()?;
        let topics = TopicPair::for_model(&identity);
        output::field("model", output::highlight(&identity));
        output::field("input", topics.input_topic());
        output::field("output", topics.output_topic());
    }
    Ok(())
}
