// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::commands::instance;
use crate::cli::{emoji, error_line, with_spinner, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::flags::{submit_flag, FlagOutcome};
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Submit) -> eyre::Result<ExitCode> {
    let challenge = ctx.find_challenge(&args.challenge)?;
    let flag = match args.flag {
        Some(flag) => flag,
        None => inquire::Text::new("Flag:").prompt()?,
    };
    let flag = flag.trim();
    let client = ctx.client().await?;

    let outcome = with_spinner("Submitting the flag", || {
        submit_flag(&client, &challenge, flag)
    })
    .await?;

    let code = match outcome {
        FlagOutcome::Correct { message, instance } => {
            println!(
                "  {} {} {}",
                emoji::TRIANGULAR_FLAG,
                style("Correct flag for").green().bold(),
                challenge
            );
            if !message.is_empty() {
                println!("  {} {}", emoji::INFORMATION, message);
            }
            match instance {
                Some(outcome) => instance::report(&challenge, &outcome),
                None => ExitCode::SUCCESS,
            }
        }
        FlagOutcome::Incorrect { message } => {
            println!(
                "  {} {}: {}",
                emoji::CROSS_MARK,
                style("Incorrect flag").red().bold(),
                message
            );
            ExitCode::SUCCESS
        }
        FlagOutcome::AlreadySolved { message } => {
            println!(
                "  {} {}: {}",
                emoji::INFORMATION,
                style("Already solved").yellow().bold(),
                message
            );
            ExitCode::SUCCESS
        }
        FlagOutcome::Failed { message } => {
            error_line("The submission failed", message);
            ExitCode::FAILURE
        }
    };

    Ok(code)
}
