// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args::{Args, Commands};
use crate::cli::Context;
use color_eyre::eyre;
use std::process::ExitCode;

pub(crate) mod challenges;
pub(crate) mod generate_token;
pub(crate) mod init;
pub(crate) mod instance;
pub(crate) mod list;
pub(crate) mod scoreboard;
pub(crate) mod solves;
pub(crate) mod submit;
pub(crate) mod sync;

pub(crate) async fn main(args: Args) -> eyre::Result<ExitCode> {
    let ctx = Context::load(args.config).await;

    match args.command {
        Commands::Init(args) => init::main(ctx, args).await,
        Commands::GenerateToken(args) => generate_token::main(ctx, args).await,
        Commands::Sync(args) => sync::main(ctx, args).await,
        Commands::List(args) => list::main(ctx, args).await,
        Commands::Challenges(args) => challenges::main(ctx, args).await,
        Commands::Submit(args) => submit::main(ctx, args).await,
        Commands::Instance(args) => instance::main(ctx, args).await,
        Commands::Scoreboard(args) => scoreboard::main(ctx, args).await,
        Commands::Solves(args) => solves::main(ctx, args).await,
    }
}
