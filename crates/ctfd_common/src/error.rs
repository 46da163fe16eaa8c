// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use reqwest::StatusCode;
use thiserror::Error;

/// Missing configuration. Each message names the subcommand that fixes it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration file not found, run `ctfd init` first or specify the URL with --url")]
    Uninitialized,
    #[error("no URL specified, check the configuration or pass --url")]
    MissingUrl,
    #[error("no token found, run `ctfd generate-token` to generate one")]
    MissingToken,
    #[error("no challenges found, run `ctfd sync` to fetch the challenges")]
    MissingChallenges,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("unable to reach the platform: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the platform at {url} is not working (status {status})")]
    Unavailable { url: String, status: StatusCode },
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response: {0}")]
    Format(String),
    #[error("invalid token: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unable to access the local state: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to serialize the local state: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("please specify either a challenge id or a challenge name")]
    NoSelector,
    #[error("no challenge found for id {0}")]
    UnknownId(u64),
    #[error("no challenge found for name {0}")]
    UnknownName(String),
}
