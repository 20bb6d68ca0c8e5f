//! Bedrock streaming benchmark CLI
//!
//! Measures time-to-first-token and generation throughput of streaming
//! model invocations on AWS Bedrock.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    cli.execute().await
}

/// Initialize tracing/logging based on verbosity and format.
fn init_tracing(verbose: u8, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(verbose > 1))
            .init();
    }
}
