// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! Models shared between the client, the local state and the CLI.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod requests;
pub mod responses;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChallengeType {
    Standard,
    /// Backed by an on-demand container instance
    Container,
    /// Any other challenge plugin, e.g. `dynamic`
    Other(String),
}

impl From<String> for ChallengeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "standard" => ChallengeType::Standard,
            "container" => ChallengeType::Container,
            _ => ChallengeType::Other(value),
        }
    }
}

impl From<ChallengeType> for String {
    fn from(value: ChallengeType) -> Self {
        match value {
            ChallengeType::Standard => "standard".to_string(),
            ChallengeType::Container => "container".to_string(),
            ChallengeType::Other(other) => other,
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeType::Standard => f.write_str("standard"),
            ChallengeType::Container => f.write_str("container"),
            ChallengeType::Other(other) => f.write_str(other),
        }
    }
}

/// A challenge as mirrored in the local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    /// Only ever set locally, once the assets of the challenge have been written to disk
    #[serde(default)]
    pub is_downloaded: bool,
}

impl Challenge {
    pub fn is_container(&self) -> bool {
        self.kind == ChallengeType::Container
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// An entry of `GET /api/v1/challenges`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteChallenge {
    pub id: u64,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub value: Option<i64>,
    pub solves: Option<u64>,
    #[serde(default)]
    pub solved_by_me: bool,
}

impl From<RemoteChallenge> for Challenge {
    fn from(remote: RemoteChallenge) -> Self {
        Challenge {
            id: remote.id,
            name: remote.name,
            category: remote.category,
            kind: remote.kind,
            is_downloaded: false,
        }
    }
}

/// The payload of `GET /api/v1/challenges/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeDetail {
    pub id: u64,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub value: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub connection_info: Option<String>,
    /// Attachment URLs relative to the platform root, usually carrying a `?token=` query
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Correct,
    Incorrect,
    AlreadySolved,
    /// Anything else the platform reports, e.g. `paused` or `ratelimited`
    Other(String),
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let status = String::deserialize(deserializer)?;
        Ok(match status.as_str() {
            "correct" => SubmissionStatus::Correct,
            "incorrect" => SubmissionStatus::Incorrect,
            "already_solved" => SubmissionStatus::AlreadySolved,
            _ => SubmissionStatus::Other(status),
        })
    }
}

/// The payload of `POST /api/v1/challenges/attempt`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptResult {
    pub status: SubmissionStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectProtocol {
    Http,
    /// Raw TCP, or whatever else the platform names
    Tcp(String),
}

impl<'de> Deserialize<'de> for ConnectProtocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let protocol = String::deserialize(deserializer)?;
        Ok(match protocol.as_str() {
            "http" => ConnectProtocol::Http,
            _ => ConnectProtocol::Tcp(protocol),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Started,
    AlreadyRunning,
    #[serde(other)]
    Unknown,
}

/// Connection details returned by the container endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceInfo {
    pub status: Option<InstanceStatus>,
    pub hostname: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    pub connect: ConnectProtocol,
}

impl InstanceInfo {
    /// How to reach the instance: a URL for HTTP challenges, a netcat line otherwise.
    pub fn connection_string(&self) -> String {
        match self.connect {
            ConnectProtocol::Http => format!("http://{}:{}", self.hostname, self.port),
            ConnectProtocol::Tcp(_) => format!("nc {} {}", self.hostname, self.port),
        }
    }
}

/// The payload of `POST /containers/api/stop`.
#[derive(Debug, Clone, Deserialize)]
pub struct StopResult {
    pub success: Option<serde_json::Value>,
}

impl StopResult {
    pub fn is_success(&self) -> bool {
        match &self.success {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(success)) => *success,
            Some(serde_json::Value::String(message)) => !message.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardSolve {
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardEntry {
    pub id: Option<u64>,
    pub name: String,
    pub score: Option<i64>,
    #[serde(default)]
    pub solves: Vec<ScoreboardSolve>,
}

impl ScoreboardEntry {
    /// The reported score, or the sum of the solve values when the platform omits it.
    pub fn total_score(&self) -> i64 {
        self.score
            .unwrap_or_else(|| self.solves.iter().map(|solve| solve.value).sum())
    }
}

/// Ranked entries of `GET /api/v1/scoreboard/top/{n}`, keyed by position.
pub type Scoreboard = BTreeMap<u32, ScoreboardEntry>;

/// An entry of `GET /api/v1/challenges/{id}/solves`.
#[derive(Debug, Clone, Deserialize)]
pub struct Solve {
    pub account_id: Option<u64>,
    pub name: String,
    pub date: String,
}

/// The payload of `POST /api/v1/tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedToken {
    pub id: Option<u64>,
    pub value: String,
    pub expiration: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn port_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(port) => port.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_deserialize_challenge_list_entry() {
        const JSON: &str = r#"{"id":7,"type":"container","name":"Baby RE","value":100,"solves":3,"solved_by_me":false,"category":"rev","tags":[],"template":"/plugins/x.html","script":"/plugins/x.js"}"#;

        let remote: RemoteChallenge = serde_json::from_str(JSON).unwrap();
        let challenge: Challenge = remote.into();
        assert_eq!(challenge.id, 7);
        assert_eq!(challenge.kind, ChallengeType::Container);
        assert!(!challenge.is_downloaded);
    }

    #[test]
    fn should_keep_unknown_challenge_types() {
        let kind: ChallengeType = serde_json::from_str(r#""dynamic""#).unwrap();
        assert_eq!(kind, ChallengeType::Other("dynamic".into()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""dynamic""#);
    }

    #[test]
    fn should_serialize_local_challenge_schema() {
        let challenge = Challenge {
            id: 1,
            name: "warmup".into(),
            category: "misc".into(),
            kind: ChallengeType::Standard,
            is_downloaded: true,
        };
        let value = serde_json::to_value(&challenge).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id":1,"name":"warmup","category":"misc","type":"standard","is_downloaded":true})
        );
    }

    #[test]
    fn should_deserialize_challenge_detail_with_null_description() {
        const JSON: &str = r#"{"id":2,"name":"pwn me","category":"pwn","type":"standard","value":500,"description":null,"connection_info":null,"files":["/files/ab12/chall.zip?token=abc"]}"#;
        let detail: ChallengeDetail = serde_json::from_str(JSON).unwrap();
        assert_eq!(detail.description, "");
        assert_eq!(detail.files.len(), 1);
    }

    #[test]
    fn should_map_submission_statuses() {
        let parse = |s: &str| -> SubmissionStatus { serde_json::from_str(s).unwrap() };
        assert_eq!(parse(r#""correct""#), SubmissionStatus::Correct);
        assert_eq!(parse(r#""incorrect""#), SubmissionStatus::Incorrect);
        assert_eq!(parse(r#""already_solved""#), SubmissionStatus::AlreadySolved);
        assert_eq!(
            parse(r#""ratelimited""#),
            SubmissionStatus::Other("ratelimited".into())
        );
    }

    #[test]
    fn should_render_http_connection_as_url() {
        let info: InstanceInfo = serde_json::from_str(
            r#"{"status":"started","hostname":"chall.ctf.io","port":31337,"connect":"http"}"#,
        )
        .unwrap();
        assert_eq!(info.status, Some(InstanceStatus::Started));
        assert_eq!(info.connection_string(), "http://chall.ctf.io:31337");
    }

    #[test]
    fn should_render_tcp_connection_as_netcat() {
        let info: InstanceInfo = serde_json::from_str(
            r#"{"hostname":"10.0.0.5","port":"4000","connect":"tcp"}"#,
        )
        .unwrap();
        assert_eq!(info.status, None);
        assert_eq!(info.connection_string(), "nc 10.0.0.5 4000");
    }

    #[test]
    fn should_recognize_stop_success_indicators() {
        let parse = |s: &str| -> StopResult { serde_json::from_str(s).unwrap() };
        assert!(parse(r#"{"success":"Instance stopped"}"#).is_success());
        assert!(parse(r#"{"success":true}"#).is_success());
        assert!(!parse(r#"{"success":false}"#).is_success());
        assert!(!parse(r#"{}"#).is_success());
    }

    #[test]
    fn should_sum_solves_when_score_is_missing() {
        const JSON: &str = r#"{"1":{"id":4,"name":"flagbearers","solves":[{"value":100},{"value":250}]},"2":{"id":9,"name":"late","score":50,"solves":[]}}"#;
        let scoreboard: Scoreboard = serde_json::from_str(JSON).unwrap();
        assert_eq!(scoreboard[&1].total_score(), 350);
        assert_eq!(scoreboard[&2].total_score(), 50);
    }
}
