//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Bedrock streaming benchmark - TTFT and throughput measurement
#[derive(Parser, Debug)]
#[command(name = "bedrock-bench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// AWS region hosting the Bedrock runtime
    #[arg(short = 'r', long, env = "AWS_REGION", default_value = "us-east-2", global = true)]
    pub region: String,

    /// Override the Bedrock runtime endpoint URL
    #[arg(long, env = "BEDROCK_ENDPOINT_URL", global = true, hide = true)]
    pub endpoint_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single measured invocation
    Quick(commands::quick::QuickArgs),

    /// Run a multi-trial performance benchmark across context sizes
    #[command(visible_alias = "bench")]
    Perf(commands::perf::PerfArgs),

    /// List registered model endpoints
    Models(commands::models::ModelsArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Quick(args) => {
                commands::quick::execute(args, &self.region, self.endpoint_url.as_deref(), self.json)
                    .await
            }
            Commands::Perf(args) => {
                commands::perf::execute(args, &self.region, self.endpoint_url.as_deref(), self.json)
                    .await
            }
            Commands::Models(args) => commands::models::execute(args, self.json),
        }
    }
}
