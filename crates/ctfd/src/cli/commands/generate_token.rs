// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, error_line, with_spinner, Context};
use color_eyre::eyre::{self, Context as _};
use console::style;
use ctfd_common::client::token::{default_expiration, TokenGenerator};
use ctfd_common::session::TokenRequirement;
use ctfd_common::store::{Section, SessionSection, StoreLocation, WriteMode};
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::GenerateToken) -> eyre::Result<ExitCode> {
    let session = ctx.session(TokenRequirement::Optional)?;
    let has_stored_token = ctx
        .state
        .session()
        .is_some_and(|stored| !stored.token.is_empty());

    if has_stored_token && !args.force {
        println!(
            "  {} {}",
            emoji::CROSS_MARK,
            style("A token is already stored, use --force to replace it")
                .red()
                .bold()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let password = match args.password {
        Some(password) => password,
        None => inquire::Password::new("Password:")
            .without_confirmation()
            .prompt()?,
    };

    let generator = TokenGenerator::new(session.base_url())?;
    let expiration = default_expiration(chrono::Local::now().date_naive());
    let generated = with_spinner("Generating a token", || {
        generator.generate(&args.name, &password, expiration)
    })
    .await;

    let token = match generated {
        Ok(token) => token,
        Err(err) => {
            error_line("Unable to generate a token", &err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let location = match &ctx.location {
        Some(location) => location.clone(),
        None => StoreLocation::for_init(&ctx.config),
    };
    let section = SessionSection {
        url: session.base_url().to_string(),
        token: token.value,
    };
    location
        .store()
        .save(Section::Ctfd, &section, WriteMode::Merge)
        .await
        .context("unable to store the token")?;
    if ctx.location.is_none() {
        location
            .remember(&ctx.config.cache_file)
            .await
            .context("unable to write the location cache")?;
    }

    println!(
        "  {} {} (expires {})",
        emoji::KEY,
        style("Token generated and stored").green().bold(),
        token.expiration.unwrap_or_else(|| expiration.to_string())
    );

    Ok(ExitCode::SUCCESS)
}
