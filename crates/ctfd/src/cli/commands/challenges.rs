// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::progress::ProgressBars;
use crate::cli::{emoji, error_line, warning_line, Context};
use color_eyre::eyre;
use console::style;
use ctfd_common::assets::{download_challenge, AssetError};
use ctfd_common::models::Challenge;
use std::process::ExitCode;

fn matches(challenge: &Challenge, args: &args::Challenges) -> bool {
    let category = args
        .category
        .as_ref()
        .map_or(true, |category| &challenge.category == category);
    let name = args
        .name
        .as_ref()
        .map_or(true, |name| &challenge.name == name);
    category && name
}

pub(crate) async fn main(ctx: Context, args: args::Challenges) -> eyre::Result<ExitCode> {
    let location = ctx.location()?;
    let store = location.store();
    let selected: Vec<Challenge> = ctx
        .challenges()?
        .into_iter()
        .filter(|challenge| matches(challenge, &args))
        .collect();

    if selected.is_empty() {
        error_line(
            "No challenges match",
            format!(
                "category {}, name {}",
                args.category.as_deref().unwrap_or("*"),
                args.name.as_deref().unwrap_or("*")
            ),
        );
        return Ok(ExitCode::FAILURE);
    }

    let client = ctx.client().await?;
    let root = location.challenges_root();
    let progress = ProgressBars;
    let mut failed = 0;
    let mut downloaded = 0;

    for challenge in &selected {
        if challenge.is_downloaded && !args.force {
            warning_line(format!(
                "{challenge} is already downloaded, use --force to download it again"
            ));
            continue;
        }

        println!(
            "  {} Downloading {}",
            emoji::PACKAGE,
            style(challenge).green().bold()
        );
        match download_challenge(&client, &store, challenge, &root, &location.dir, &progress).await
        {
            Ok(result) => {
                downloaded += 1;
                println!(
                    "  {} {} files to {}",
                    emoji::CHECK_MARK,
                    result.files.len(),
                    style(result.dir.display()).underlined()
                );
            }
            Err(err @ (AssetError::NotFound { .. } | AssetError::Remote { .. })) => {
                failed += 1;
                error_line("Unable to fetch the challenge", err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "\n  {} Downloaded {} challenges",
        emoji::SPARKLES,
        style(downloaded).green().bold()
    );

    if failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::matches;
    use crate::args;
    use ctfd_common::models::{Challenge, ChallengeType};

    fn challenge(name: &str, category: &str) -> Challenge {
        Challenge {
            id: 1,
            name: name.to_string(),
            category: category.to_string(),
            kind: ChallengeType::Standard,
            is_downloaded: false,
        }
    }

    fn filters(category: Option<&str>, name: Option<&str>) -> args::Challenges {
        args::Challenges {
            category: category.map(str::to_string),
            name: name.map(str::to_string),
            force: false,
        }
    }

    #[test]
    fn should_match_everything_without_filters() {
        assert!(matches(&challenge("Baby RE", "rev"), &filters(None, None)));
    }

    #[test]
    fn should_require_both_filters_to_match() {
        let baby_re = challenge("Baby RE", "rev");

        assert!(matches(&baby_re, &filters(Some("rev"), Some("Baby RE"))));
        assert!(!matches(&baby_re, &filters(Some("pwn"), Some("Baby RE"))));
        assert!(!matches(&baby_re, &filters(Some("rev"), Some("Baby Pwn"))));
    }
}
