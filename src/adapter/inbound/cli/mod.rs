//! CLI module graph.

pub mod check;
pub mod command;
pub mod output;
pub mod run;
pub mod topics;

use self::command::{CheckCommand, Cli, ColorChoice, Commands};

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Whatever the selected command reports, with context for the operator.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args.config),
        Commands::Topics(args) => topics::execute(&args.config),
    }
}
