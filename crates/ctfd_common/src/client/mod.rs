// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::error::ClientError;
use crate::models::requests::{AttemptRequest, ContainerRequest};
use crate::models::responses::ApiResponse;
use crate::models::{
    AttemptResult, ChallengeDetail, InstanceInfo, RemoteChallenge, Scoreboard, Solve, StopResult,
};
use crate::session::PlatformSession;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

pub mod download;
pub mod token;

/// The authenticated platform client. Every request to the platform carries the token, nothing
/// is retried.
pub struct CtfdClient {
    client: reqwest::Client,
    /// For attachments hosted outside the platform, e.g. presigned bucket URLs
    anonymous: reqwest::Client,
    session: PlatformSession,
}

/// How a response body is laid out.
#[derive(Clone, Copy)]
enum Shape {
    /// `{"success": .., "data": ..}`, used by `/api/v1`
    Envelope,
    /// The payload itself, used by `/containers/api`
    Bare,
}

impl CtfdClient {
    pub fn new(session: PlatformSession) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if session.has_token() {
            let mut value = HeaderValue::from_str(&format!("Token {}", session.token()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let anonymous = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            anonymous,
            session,
        })
    }

    /// Creates the client and, unless `probe` is false, checks that the platform answers.
    pub async fn connect(session: PlatformSession, probe: bool) -> Result<Self, ClientError> {
        let client = Self::new(session)?;
        if probe {
            client.probe().await?;
        }
        Ok(client)
    }

    pub fn session(&self) -> &PlatformSession {
        &self.session
    }

    /// Checks the connection with `GET /api/v1/users`, which requires a working platform and
    /// an accepted token.
    pub async fn probe(&self) -> Result<(), ClientError> {
        let url = self.session.endpoint("/api/v1/users");
        debug!(%url, "checking the connection to the platform");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Unavailable { url, status });
        }

        info!(url = self.session.base_url(), "the platform is working");
        Ok(())
    }

    pub async fn get_challenges(&self) -> Result<ApiResponse<Vec<RemoteChallenge>>, ClientError> {
        self.request(Method::GET, "/api/v1/challenges", None::<&()>, Shape::Envelope)
            .await
    }

    /// Fetches the full challenge. A missing challenge is `ApiResponse::NotFound`.
    pub async fn get_challenge(
        &self,
        id: u64,
    ) -> Result<ApiResponse<ChallengeDetail>, ClientError> {
        let path = format!("/api/v1/challenges/{id}");
        self.request(Method::GET, &path, None::<&()>, Shape::Envelope)
            .await
    }

    pub async fn submit_flag(
        &self,
        id: u64,
        flag: &str,
    ) -> Result<ApiResponse<AttemptResult>, ClientError> {
        let body = AttemptRequest {
            challenge_id: id,
            submission: flag.to_string(),
        };
        self.request(
            Method::POST,
            "/api/v1/challenges/attempt",
            Some(&body),
            Shape::Envelope,
        )
        .await
    }

    pub async fn start_instance(&self, id: u64) -> Result<ApiResponse<InstanceInfo>, ClientError> {
        self.request(
            Method::POST,
            "/containers/api/request",
            Some(&ContainerRequest { chal_id: id }),
            Shape::Bare,
        )
        .await
    }

    pub async fn extend_instance(&self, id: u64) -> Result<ApiResponse<InstanceInfo>, ClientError> {
        self.request(
            Method::POST,
            "/containers/api/renew",
            Some(&ContainerRequest { chal_id: id }),
            Shape::Bare,
        )
        .await
    }

    pub async fn stop_instance(&self, id: u64) -> Result<ApiResponse<StopResult>, ClientError> {
        self.request(
            Method::POST,
            "/containers/api/stop",
            Some(&ContainerRequest { chal_id: id }),
            Shape::Bare,
        )
        .await
    }

    pub async fn get_scoreboard(&self, count: u32) -> Result<ApiResponse<Scoreboard>, ClientError> {
        let path = format!("/api/v1/scoreboard/top/{count}");
        self.request(Method::GET, &path, None::<&()>, Shape::Envelope)
            .await
    }

    /// An empty list means nobody has solved the challenge yet.
    pub async fn get_solves(&self, id: u64) -> Result<ApiResponse<Vec<Solve>>, ClientError> {
        let path = format!("/api/v1/challenges/{id}/solves");
        self.request(Method::GET, &path, None::<&()>, Shape::Envelope)
            .await
    }

    async fn request<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        shape: Shape,
    ) -> Result<ApiResponse<R>, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.session.endpoint(path);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(%status, %url, len = bytes.len(), "received response");

        match shape {
            Shape::Envelope => ApiResponse::from_envelope(status, &bytes),
            Shape::Bare => ApiResponse::from_bare(status, &bytes),
        }
    }
}
