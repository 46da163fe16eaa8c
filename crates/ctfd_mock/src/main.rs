// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use anyhow::Result;
use clap::Parser;
use ctfd_mock::{MockPlatform, MOCK_PASSWORD, MOCK_TOKEN, MOCK_USER};
use tracing::info;

/// A mock CTFd platform for trying out the CLI
#[derive(Parser)]
struct Args {
    #[clap(default_value = "127.0.0.1:8000")]
    listen_on: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let listener = tokio::net::TcpListener::bind(&args.listen_on).await?;
    info!(
        addr = %listener.local_addr()?,
        token = MOCK_TOKEN,
        user = MOCK_USER,
        password = MOCK_PASSWORD,
        "serving mock platform"
    );

    ctfd_mock::serve(listener, MockPlatform::default()).await
}
