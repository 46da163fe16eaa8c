// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct AttemptRequest {
    pub challenge_id: u64,
    pub submission: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ContainerRequest {
    pub chal_id: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenRequest {
    pub description: String,
    /// The expiry date formatted as `YYYY-MM-DD`
    pub expiration: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginForm {
    pub name: String,
    pub password: String,
    #[serde(rename = "_submit")]
    pub submit: String,
    pub nonce: String,
}
