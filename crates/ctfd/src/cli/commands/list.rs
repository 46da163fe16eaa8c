// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{tables, warning_line, Context};
use color_eyre::eyre;
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::List) -> eyre::Result<ExitCode> {
    let challenges = ctx.challenges()?;
    let selected: Vec<_> = challenges
        .iter()
        .filter(|c| {
            args.category
                .as_ref()
                .map_or(true, |category| &c.category == category)
        })
        .collect();

    if selected.is_empty() {
        warning_line(format!(
            "No challenges in category {}",
            args.category.as_deref().unwrap_or_default()
        ));
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", tables::challenges(selected));
    Ok(ExitCode::SUCCESS)
}
