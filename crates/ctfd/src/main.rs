// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod args;
mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    // The environment fallbacks of the arguments may come from a .env file
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = args::Args::parse();
    cli::commands::main(args).await
}
