//! calsnap CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use calsnap_cli::cli::{Cli, Command, ConfigAction};
use calsnap_cli::commands;
use calsnap_cli::config::AppConfig;
use calsnap_cli::error::ClientResult;
use calsnap_core::{TracingConfig, init_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env-backed flags
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config.with_format(cli.log_format.into())) {
        eprintln!("warning: {}", e);
    }
    match dotenv {
        Ok(path) => tracing::debug!("loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env file: {}", e),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.render());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);

    match cli.command {
        None | Some(Command::Fetch) => commands::fetch::run(&config, cli.print).await,
        Some(Command::Auth { force }) => commands::auth::google(&config, force).await,
        Some(Command::Calendars) => commands::calendars::list(&config).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
