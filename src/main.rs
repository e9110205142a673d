//! Bazaar CLI

use std::process;

use clap::Parser;
use tracing::error;

mod cli;

/// Bazaar CLI entry point
#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(init_error) = cli::observability::init(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln"
        )]
        {
            eprintln!("{init_error}");
        }

        process::exit(1);
    }

    if let Err(run_error) = cli.run().await {
        error!("{run_error}");

        process::exit(1);
    }
}
