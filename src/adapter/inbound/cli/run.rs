//! Handler for the `run` command.

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::predictor::PredictorRegistry;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Execute the run command: serve every configured model until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a predictor cannot be
/// built, or startup fails under the configured policy.
pub async fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("invalid configuration in {}", args.config.display()))?;
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    if !output::is_quiet() && !args.json_logs {
        print_startup_config(&config);
    }

    let broker = bootstrap::build_broker(&config.broker)?;
    let mut orchestrator =
        bootstrap::build_orchestrator(&config, &PredictorRegistry::with_builtins(), broker)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl-C; stop the process to shut down");
                std::future::pending::<()>().await;
            }
        }
    });

    info!(models = orchestrator.len(), "modelbus starting");
    let result = orchestrator.run(shutdown_rx).await;
    signal_task.abort();
    result.context("model services failed to start")?;

    info!("modelbus stopped");
    Ok(())
}

fn print_startup_config(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Broker", &config.broker.address);
    output::field("Group", &config.broker.group_id);
    output::field("Models", config.models.len());
}
