//! toolbox CLI — load and inspect a toolbox document tree.
//!
//! Fetches the root manifest and every category sub-document from a serving
//! root (HTTP or local directory) and prints the aggregated model.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
