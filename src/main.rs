mod auth;
mod circle;
mod cli;
mod config;
mod correlator;
mod error;
mod hierarchy;
mod output;
mod scanner;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting circletrace");
    cli.execute().await?;

    Ok(())
}
