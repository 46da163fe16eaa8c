// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, error_line, tables, with_spinner, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::models::responses::ApiResponse;
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Scoreboard) -> eyre::Result<ExitCode> {
    let client = ctx.client().await?;

    let response = with_spinner("Fetching the scoreboard", || {
        client.get_scoreboard(args.number)
    })
    .await?;

    let scoreboard = match response {
        ApiResponse::Ok(scoreboard) => scoreboard,
        ApiResponse::NotFound(message) | ApiResponse::Error(message) => {
            error_line("Unable to fetch the scoreboard", message);
            return Ok(ExitCode::FAILURE);
        }
    };

    if scoreboard.is_empty() {
        println!(
            "  {} {}",
            emoji::INFORMATION,
            style("The scoreboard is empty").yellow().bold()
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "  {} {}",
        emoji::TROPHY,
        style(format!("Top {}", args.number)).bold()
    );
    println!("{}", tables::scoreboard(&scoreboard));
    Ok(ExitCode::SUCCESS)
}
