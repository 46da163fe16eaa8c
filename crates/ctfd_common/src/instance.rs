// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! Start, extend and stop per-challenge container instances.
//!
//! The platform owns the instance state. The client only interprets each response; it never
//! checks the prior state itself.

use crate::client::CtfdClient;
use crate::error::ClientError;
use crate::models::responses::ApiResponse;
use crate::models::{InstanceInfo, InstanceStatus};
use clap::ValueEnum;
use tracing::{info, warn};

/// Matched case-insensitively against start errors that require stopping another instance.
pub const STOP_FIRST_PATTERN: &str = "please stop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InstanceAction {
    Start,
    Extend,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceOutcome {
    Started(InstanceInfo),
    /// Not a failure; the existing instance is reused
    AlreadyRunning(InstanceInfo),
    Extended(InstanceInfo),
    Stopped,
    Failed {
        message: String,
        /// Another instance has to be stopped before this one can start
        must_stop_first: bool,
    },
}

impl InstanceOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, InstanceOutcome::Failed { .. })
    }

    pub fn connection(&self) -> Option<&InstanceInfo> {
        match self {
            InstanceOutcome::Started(info)
            | InstanceOutcome::AlreadyRunning(info)
            | InstanceOutcome::Extended(info) => Some(info),
            _ => None,
        }
    }

    fn failed(message: String) -> Self {
        InstanceOutcome::Failed {
            message,
            must_stop_first: false,
        }
    }
}

pub struct InstanceManager<'a> {
    client: &'a CtfdClient,
}

impl<'a> InstanceManager<'a> {
    pub fn new(client: &'a CtfdClient) -> Self {
        Self { client }
    }

    pub async fn run(
        &self,
        action: InstanceAction,
        id: u64,
    ) -> Result<InstanceOutcome, ClientError> {
        match action {
            InstanceAction::Start => self.start(id).await,
            InstanceAction::Extend => self.extend(id).await,
            InstanceAction::Stop => self.stop(id).await,
        }
    }

    pub async fn start(&self, id: u64) -> Result<InstanceOutcome, ClientError> {
        info!(id, "starting instance");
        let outcome = match self.client.start_instance(id).await? {
            ApiResponse::Ok(info) => match info.status {
                Some(InstanceStatus::AlreadyRunning) => {
                    warn!(id, "an instance is already running for this challenge");
                    InstanceOutcome::AlreadyRunning(info)
                }
                _ => InstanceOutcome::Started(info),
            },
            ApiResponse::Error(message) | ApiResponse::NotFound(message) => {
                let must_stop_first = requires_stop_first(&message);
                InstanceOutcome::Failed {
                    message,
                    must_stop_first,
                }
            }
        };
        Ok(outcome)
    }

    pub async fn extend(&self, id: u64) -> Result<InstanceOutcome, ClientError> {
        info!(id, "extending instance");
        let outcome = match self.client.extend_instance(id).await? {
            ApiResponse::Ok(info) => InstanceOutcome::Extended(info),
            ApiResponse::Error(message) | ApiResponse::NotFound(message) => {
                InstanceOutcome::failed(message)
            }
        };
        Ok(outcome)
    }

    /// Succeeds whenever the platform confirms, whether or not an instance was running.
    pub async fn stop(&self, id: u64) -> Result<InstanceOutcome, ClientError> {
        info!(id, "stopping instance");
        let outcome = match self.client.stop_instance(id).await? {
            ApiResponse::Ok(result) if result.is_success() => InstanceOutcome::Stopped,
            ApiResponse::Ok(_) => {
                InstanceOutcome::failed("the platform did not confirm the stop".to_string())
            }
            ApiResponse::Error(message) | ApiResponse::NotFound(message) => {
                InstanceOutcome::failed(message)
            }
        };
        Ok(outcome)
    }
}

pub fn requires_stop_first(message: &str) -> bool {
    message.to_lowercase().contains(STOP_FIRST_PATTERN)
}

#[cfg(test)]
mod tests {
    use super::requires_stop_first;

    #[test]
    fn should_detect_stop_first_errors() {
        assert!(requires_stop_first(
            "You already have a running instance. Please stop it before starting another one."
        ));
        assert!(requires_stop_first("please STOP the other instance"));
        assert!(!requires_stop_first("Instance quota exceeded"));
    }
}
