// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::args::ChallengeSelector;
use color_eyre::eyre;
use console::style;
use ctfd_common::client::CtfdClient;
use ctfd_common::config::Config;
use ctfd_common::error::ConfigError;
use ctfd_common::models::Challenge;
use ctfd_common::session::{PlatformSession, TokenRequirement};
use ctfd_common::store::{LocalState, StoreLocation};
use futures::Future;
use indicatif::ProgressBar;
use std::time::Duration;
use tracing::debug;

pub(crate) mod commands;
mod emoji;
mod progress;
mod tables;

/// Displays a spinner in the console while the future is running. The caller is responsible for
/// displaying a message signifying the completion.
async fn with_spinner<F, Fut, T, E>(message: &'static str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(130));
    pb.set_message(message);

    let res = f().await;
    pb.finish_and_clear();

    res
}

fn error_line(message: &str, detail: impl std::fmt::Display) {
    println!(
        "  {} {}: {}",
        emoji::CROSS_MARK,
        style(message).red().bold(),
        detail
    );
}

fn warning_line(message: impl std::fmt::Display) {
    println!("  {} {}", emoji::WARNING, style(message).yellow().bold());
}

/// Everything one invocation knows before talking to the platform. Built once in `main` and
/// handed to the subcommand.
pub(crate) struct Context {
    pub config: Config,
    /// `None` when no local state could be found
    pub location: Option<StoreLocation>,
    pub state: LocalState,
}

impl Context {
    pub(crate) async fn load(config: Config) -> Self {
        let location = StoreLocation::resolve(&config).await;
        let state = match &location {
            Some(location) => {
                debug! {
                    dir = %location.dir.display(),
                    source = ?location.source,
                    "resolved the local state"
                }
                location.store().load().await
            }
            None => LocalState::default(),
        };

        Self {
            config,
            location,
            state,
        }
    }

    /// The location of an initialized configuration.
    pub(crate) fn location(&self) -> Result<&StoreLocation, ConfigError> {
        self.location.as_ref().ok_or(ConfigError::Uninitialized)
    }

    pub(crate) fn session(
        &self,
        requirement: TokenRequirement,
    ) -> Result<PlatformSession, ConfigError> {
        PlatformSession::resolve(
            self.config.url.as_deref(),
            self.config.token.as_deref(),
            &self.state,
            requirement,
        )
    }

    /// Builds an authenticated client, checking the connection unless `--skip` is given.
    pub(crate) async fn client(&self) -> eyre::Result<CtfdClient> {
        let session = self.session(TokenRequirement::Required)?;
        let probe = !self.config.skip;
        let client = with_spinner("Connecting to the platform", || {
            CtfdClient::connect(session, probe)
        })
        .await?;
        Ok(client)
    }

    pub(crate) fn challenges(&self) -> Result<Vec<Challenge>, ConfigError> {
        let challenges = self.state.challenges();
        if challenges.is_empty() {
            return Err(ConfigError::MissingChallenges);
        }
        Ok(challenges)
    }

    pub(crate) fn find_challenge(&self, selector: &ChallengeSelector) -> eyre::Result<Challenge> {
        if !self.state.has_challenges() {
            return Err(ConfigError::MissingChallenges.into());
        }
        let challenge = self
            .state
            .find_challenge(selector.id, selector.name.as_deref())?;
        Ok(challenge)
    }
}
