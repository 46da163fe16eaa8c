// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args;
use crate::cli::{emoji, warning_line, with_spinner, Context};
use color_eyre::eyre::{self, Context as _};
use console::style;
use ctfd_common::client::CtfdClient;
use ctfd_common::error::ConfigError;
use ctfd_common::session::{normalize_url, PlatformSession};
use ctfd_common::store::{Section, SessionSection, StoreLocation, WriteMode};
use std::process::ExitCode;

pub(crate) async fn main(ctx: Context, args: args::Init) -> eyre::Result<ExitCode> {
    // A fresh configuration never reuses the cached location
    let location = StoreLocation::for_init(&ctx.config);
    let store = location.store();

    if store.exists().await && !args.force {
        println!(
            "  {} {}",
            emoji::CROSS_MARK,
            style("The configuration file already exists, use --force to overwrite it")
                .red()
                .bold()
        );
        println!("  {} {}", emoji::INFORMATION, store.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let url = match ctx.config.url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => url.to_string(),
        None => inquire::Text::new("Platform URL:").prompt()?,
    };
    let url = normalize_url(&url);
    if url.is_empty() {
        return Err(ConfigError::MissingUrl.into());
    }

    let token = match (args.token.or(ctx.config.token.clone()), args.no_token) {
        (Some(token), _) => token,
        (None, true) => String::new(),
        (None, false) => inquire::Password::new("API token:")
            .without_confirmation()
            .with_help_message("Leave empty to generate one later")
            .prompt()?,
    };
    let token = token.trim().to_string();

    if token.is_empty() {
        warning_line("No token given, run `ctfd generate-token` to create one");
    } else if !ctx.config.skip {
        let session = PlatformSession::new(&url, token.as_str())?;
        with_spinner("Checking the token", || CtfdClient::connect(session, true)).await?;
    }

    let section = SessionSection { url, token };
    store
        .save(Section::Ctfd, &section, WriteMode::Replace)
        .await
        .context("unable to write the configuration file")?;
    location
        .remember(&ctx.config.cache_file)
        .await
        .context("unable to write the location cache")?;

    println!(
        "  {} {} {}",
        emoji::CHECK_MARK,
        style("Configuration created:").green().bold(),
        store.path().display()
    );
    println!(
        "  {} Run {} to fetch the challenges",
        emoji::INFORMATION,
        style("ctfd sync").bold()
    );

    Ok(ExitCode::SUCCESS)
}
