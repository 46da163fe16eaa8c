// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::error::ConfigError;
use crate::store::LocalState;

/// The endpoint and credential used by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSession {
    base_url: String,
    token: String,
}

/// Whether the operation about to run needs an API token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequirement {
    Required,
    Optional,
}

impl PlatformSession {
    pub fn new<S: Into<String>>(url: &str, token: S) -> Result<Self, ConfigError> {
        let base_url = normalize_url(url);
        if base_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        Ok(Self {
            base_url,
            token: token.into(),
        })
    }

    /// Resolves the URL and token. `url` and `token` are the values given on the command line or
    /// through the environment, and take precedence over the local state.
    pub fn resolve(
        url: Option<&str>,
        token: Option<&str>,
        state: &LocalState,
        requirement: TokenRequirement,
    ) -> Result<Self, ConfigError> {
        let stored = state.session();
        let url = match (non_empty(url), &stored) {
            (Some(url), _) => url.to_string(),
            (None, Some(stored)) => stored.url.clone(),
            (None, None) if state.is_empty() => return Err(ConfigError::Uninitialized),
            (None, None) => return Err(ConfigError::MissingUrl),
        };

        let token = match (non_empty(token), &stored) {
            (Some(token), _) => token.to_string(),
            (None, Some(stored)) => stored.token.clone(),
            (None, None) => String::new(),
        };

        if requirement == TokenRequirement::Required && token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        Self::new(&url, token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Joins a path such as `/api/v1/challenges` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

/// Removes trailing slashes and prefixes `http://` when no scheme is given.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
