// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, error_line, tables, with_spinner, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::models::responses::ApiResponse;
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Solves) -> eyre::Result<ExitCode> {
    let challenge = ctx.find_challenge(&args.challenge)?;
    let client = ctx.client().await?;

    let response = with_spinner("Fetching the solves", || client.get_solves(challenge.id)).await?;
    let solves = match response {
        ApiResponse::Ok(solves) => solves,
        ApiResponse::NotFound(message) | ApiResponse::Error(message) => {
            error_line("Unable to fetch the solves", message);
            return Ok(ExitCode::FAILURE);
        }
    };

    if solves.is_empty() {
        println!(
            "  {} {} {}",
            emoji::INFORMATION,
            style("No solves yet for").yellow().bold(),
            challenge
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "  {} {} solves for {}",
        emoji::TRIANGULAR_FLAG,
        solves.len(),
        style(&challenge).bold()
    );
    println!("{}", tables::solves(&solves));
    Ok(ExitCode::SUCCESS)
}
