//! Binary crate for the `consensus` command-line tool and HTTP server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly and JSON output
//! - Serving the HTTP API

use clap::Parser;

mod cli;
mod logging;
mod output;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    logging::init_logging(&logging::LogConfig::from_env())?;

    let cmd = cli::Cli::parse();
    cmd.run().await
}
