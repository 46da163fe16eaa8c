// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::error::{ClientError, ConfigError};
use crate::models::requests::{LoginForm, TokenRequest};
use crate::models::responses::ApiResponse;
use crate::models::GeneratedToken;
use crate::session::normalize_url;
use chrono::{Months, NaiveDate};
use regex::Regex;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

const TOKEN_DESCRIPTION: &str = "Generated by ctfd-cli";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("unable to reach the platform: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unable to find the CSRF nonce on {0}")]
    MissingNonce(String),
    #[error("unable to log in (status {0})")]
    LoginFailed(StatusCode),
    #[error("the platform refused to generate a token: {0}")]
    Rejected(String),
}

/// Logs in with a username and password and creates an API token, the way the web UI does.
pub struct TokenGenerator {
    client: reqwest::Client,
    base_url: String,
    nonce_pattern: Regex,
}

impl TokenGenerator {
    pub fn new(url: &str) -> Result<Self, TokenError> {
        let base_url = normalize_url(url);
        if base_url.is_empty() {
            return Err(ConfigError::MissingUrl.into());
        }

        let client = reqwest::Client::builder().cookie_store(true).build()?;
        let nonce_pattern = Regex::new(r#"'csrfNonce': "(.*?)""#)
            .map_err(|err| ClientError::Format(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            nonce_pattern,
        })
    }

    pub async fn generate(
        &self,
        name: &str,
        password: &str,
        expiration: NaiveDate,
    ) -> Result<GeneratedToken, TokenError> {
        self.login(name, password).await?;

        info!("generating token");
        let nonce = self.csrf_nonce("/").await?;
        let request = TokenRequest {
            description: TOKEN_DESCRIPTION.to_string(),
            expiration: expiration.format("%Y-%m-%d").to_string(),
        };
        let response = self
            .client
            .post(format!("{}/api/v1/tokens", self.base_url))
            .header("CSRF-Token", nonce)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        match ApiResponse::<GeneratedToken>::from_envelope(status, &body)? {
            ApiResponse::Ok(token) if status == StatusCode::OK => Ok(token),
            ApiResponse::Ok(_) => Err(TokenError::Rejected(format!("status {status}"))),
            ApiResponse::NotFound(message) | ApiResponse::Error(message) => {
                Err(TokenError::Rejected(message))
            }
        }
    }

    async fn login(&self, name: &str, password: &str) -> Result<(), TokenError> {
        info!(name, "logging in");
        let nonce = self.csrf_nonce("/login").await?;
        let form = LoginForm {
            name: name.to_string(),
            password: password.to_string(),
            submit: "Submit".to_string(),
            nonce,
        };

        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::FOUND {
            return Err(TokenError::LoginFailed(status));
        }
        // A failed login renders the login page again instead of redirecting away from it
        if response.url().path().trim_end_matches('/').ends_with("/login") {
            return Err(TokenError::LoginFailed(StatusCode::UNAUTHORIZED));
        }

        info!(name, "logged in");
        Ok(())
    }

    async fn csrf_nonce(&self, page: &str) -> Result<String, TokenError> {
        let url = format!("{}{}", self.base_url, page);
        let html = self.client.get(&url).send().await?.text().await?;
        debug!(%url, "looking for the CSRF nonce");

        extract_nonce(&self.nonce_pattern, &html).ok_or(TokenError::MissingNonce(url))
    }
}

fn extract_nonce(pattern: &Regex, html: &str) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|nonce| nonce.as_str().to_string())
}

/// Tokens are generated to expire one year from `today`.
pub fn default_expiration(today: NaiveDate) -> NaiveDate {
    today.checked_add_months(Months::new(12)).unwrap_or(today)
}
