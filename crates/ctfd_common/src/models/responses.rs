// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::error::ClientError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The normalized outcome of a single platform call.
///
/// The platform signals problems in several ways: a `message` field for missing resources, an
/// `error` (or `errors`) field for operational failures, and plain HTTP statuses otherwise. All of
/// them are folded into this type here so callers only ever match on three variants.
#[derive(Debug, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    /// The resource does not exist. Carries the platform's message.
    NotFound(String),
    /// The platform refused the operation. Carries the platform's message verbatim.
    Error(String),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Interprets a body wrapped in the `{"success": .., "data": ..}` envelope used by `/api/v1`.
    pub fn from_envelope(status: StatusCode, body: &[u8]) -> Result<Self, ClientError> {
        let value = match parse_body(status, body)? {
            Classified::Payload(value) => value,
            Classified::NotFound(message) => return Ok(ApiResponse::NotFound(message)),
            Classified::Error(message) => return Ok(ApiResponse::Error(message)),
        };

        match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(data) => Ok(ApiResponse::Ok(decode(data)?)),
                None if !status.is_success() => Ok(ApiResponse::Error(status_message(status))),
                None => Err(ClientError::Format("missing `data` field".to_string())),
            },
            _ if !status.is_success() => Ok(ApiResponse::Error(status_message(status))),
            _ => Err(ClientError::Format("expected a JSON object".to_string())),
        }
    }

    /// Interprets a bare body, as returned by the container endpoints.
    pub fn from_bare(status: StatusCode, body: &[u8]) -> Result<Self, ClientError> {
        match parse_body(status, body)? {
            Classified::Payload(_) if !status.is_success() => {
                Ok(ApiResponse::Error(status_message(status)))
            }
            Classified::Payload(value) => Ok(ApiResponse::Ok(decode(value)?)),
            Classified::NotFound(message) => Ok(ApiResponse::NotFound(message)),
            Classified::Error(message) => Ok(ApiResponse::Error(message)),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            ApiResponse::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        match self {
            ApiResponse::Ok(value) => ApiResponse::Ok(f(value)),
            ApiResponse::NotFound(message) => ApiResponse::NotFound(message),
            ApiResponse::Error(message) => ApiResponse::Error(message),
        }
    }
}

enum Classified {
    Payload(Value),
    NotFound(String),
    Error(String),
}

fn parse_body(status: StatusCode, body: &[u8]) -> Result<Classified, ClientError> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => return Ok(Classified::Error(status_message(status))),
        Err(err) => return Err(ClientError::Format(err.to_string())),
    };

    if let Some(error) = value.get("error").and_then(non_empty_str) {
        return Ok(Classified::Error(error.to_string()));
    }
    if let Some(errors) = value.get("errors").and_then(collect_errors) {
        return Ok(Classified::Error(errors));
    }
    if value.get("data").is_none() {
        if let Some(message) = value.get("message").and_then(non_empty_str) {
            // Authentication failures also carry a message, but they are not absences
            return Ok(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Classified::Error(message.to_string())
                }
                _ => Classified::NotFound(message.to_string()),
            });
        }
    }

    Ok(Classified::Payload(value))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|err| ClientError::Format(err.to_string()))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Flattens the `{"errors": {"field": ["reason", ..]}}` shape into one line.
fn collect_errors(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let messages: Vec<String> = map
        .iter()
        .flat_map(|(field, reasons)| match reasons {
            Value::Array(reasons) => reasons
                .iter()
                .filter_map(|reason| reason.as_str())
                .map(|reason| format!("{field}: {reason}"))
                .collect(),
            Value::String(reason) => vec![format!("{field}: {reason}")],
            _ => Vec::new(),
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

fn status_message(status: StatusCode) -> String {
    format!("request failed with status {status}")
}
