//! keybridge CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use keybridge_cli::{load_config, log_directive, run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // stdout carries protocol payloads, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_directive(&config.logging.level, cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Errors are printed to stdout verbatim; callers match on the text.
    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}
