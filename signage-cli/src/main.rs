//! Binary crate for the `signage` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Running the weather proxy
//! - Printing the dashboard stores and interactive configuration

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose);
    cmd.run().await
}
