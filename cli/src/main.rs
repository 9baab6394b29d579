//! rigup - install developer tools and shell environments from scripts

#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rigup_cli::cli::Cli;
use rigup_cli::output::json::{error_code, format_error};

/// Log filter variable; takes precedence over `--verbose`.
const LOG_ENV: &str = "RIGUP_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if json && let Ok(doc) = format_error(&format!("{e:#}"), error_code(&e)) {
                println!("{doc}");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
