// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, error_line, with_spinner, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::instance::{InstanceAction, InstanceManager, InstanceOutcome};
use ctfd_common::models::{Challenge, InstanceInfo};
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Instance) -> eyre::Result<ExitCode> {
    let challenge = ctx.find_challenge(&args.challenge)?;
    if !challenge.is_container() {
        error_line("Not a container challenge", &challenge);
        return Ok(ExitCode::FAILURE);
    }

    let client = ctx.client().await?;
    let manager = InstanceManager::new(&client);
    let message = match args.action {
        InstanceAction::Start => "Starting the instance",
        InstanceAction::Extend => "Extending the instance",
        InstanceAction::Stop => "Stopping the instance",
    };
    let outcome = with_spinner(message, || manager.run(args.action, challenge.id)).await?;

    Ok(report(&challenge, &outcome))
}

fn connection_line(info: &InstanceInfo) {
    println!(
        "  {} Connect with {}",
        emoji::INFORMATION,
        style(info.connection_string()).underlined()
    );
}

/// Prints the outcome of an instance operation.
pub(crate) fn report(challenge: &Challenge, outcome: &InstanceOutcome) -> ExitCode {
    match outcome {
        InstanceOutcome::Started(info) => {
            println!(
                "  {} {} {}",
                emoji::ROCKET,
                style("Instance started for").green().bold(),
                challenge
            );
            connection_line(info);
        }
        InstanceOutcome::AlreadyRunning(info) => {
            println!(
                "  {} {} {}",
                emoji::WARNING,
                style("An instance is already running for").yellow().bold(),
                challenge
            );
            connection_line(info);
        }
        InstanceOutcome::Extended(info) => {
            println!(
                "  {} {} {}",
                emoji::CHECK_MARK,
                style("Instance extended for").green().bold(),
                challenge
            );
            connection_line(info);
        }
        InstanceOutcome::Stopped => {
            println!(
                "  {} {} {}",
                emoji::CHECK_MARK,
                style("Instance stopped for").green().bold(),
                challenge
            );
        }
        InstanceOutcome::Failed {
            message,
            must_stop_first,
        } => {
            error_line("The instance request failed", message);
            if *must_stop_first {
                println!(
                    "  {} Another instance is running, stop it first with {}",
                    emoji::INFORMATION,
                    style("ctfd instance stop -i <id>").bold()
                );
            }
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
