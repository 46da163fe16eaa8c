// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, warning_line, with_spinner, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::sync::{synchronize, SyncError};
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Sync) -> eyre::Result<ExitCode> {
    let location = ctx.location()?;
    let store = location.store();
    let root = location.challenges_root();
    let client = ctx.client().await?;

    let synchronized = with_spinner("Fetching the challenges", || {
        synchronize(&client, &store, &root, args.force)
    })
    .await;

    let challenges = match synchronized {
        Ok(challenges) => challenges,
        Err(err @ SyncError::AlreadySynced) => {
            warning_line(err);
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(err.into()),
    };

    let downloaded = challenges.iter().filter(|c| c.is_downloaded).count();
    println!(
        "  {} {} {} challenges",
        emoji::CHECK_MARK,
        style("Synchronized").green().bold(),
        challenges.len()
    );
    if downloaded > 0 {
        println!(
            "  {} {} of them were already downloaded",
            emoji::INFORMATION,
            downloaded
        );
    }

    Ok(ExitCode::SUCCESS)
}
