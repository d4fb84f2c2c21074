mod cli;
mod config;
mod exec;
mod github;
mod launch;
mod model;
mod registry;
mod utility;

use std::{io, process};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    if let Err(e) = cli::run(cli, &config).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Log to stderr. `HARBOUR_LOG` wins over `RUST_LOG`; without either,
/// only warnings show unless `--verbose` was passed.
fn init_tracing(verbose: bool) {
    let default = if verbose { "harbour=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("HARBOUR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
