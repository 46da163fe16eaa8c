// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::client::CtfdClient;
use crate::error::ClientError;
use crate::instance::{InstanceManager, InstanceOutcome};
use crate::models::responses::ApiResponse;
use crate::models::{AttemptResult, Challenge, SubmissionStatus};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagOutcome {
    /// For container challenges the instance is stopped right away; `instance` holds the result.
    Correct {
        message: String,
        instance: Option<InstanceOutcome>,
    },
    Incorrect {
        message: String,
    },
    AlreadySolved {
        message: String,
    },
    /// Any other status, e.g. a paused event or rate limiting
    Failed {
        message: String,
    },
}

impl FlagOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            FlagOutcome::Correct { .. } => "correct",
            FlagOutcome::Incorrect { .. } => "incorrect",
            FlagOutcome::AlreadySolved { .. } => "already_solved",
            FlagOutcome::Failed { .. } => "failed",
        }
    }
}

/// Submits `flag` for `challenge`. The local state is never touched.
pub async fn submit_flag(
    client: &CtfdClient,
    challenge: &Challenge,
    flag: &str,
) -> Result<FlagOutcome, ClientError> {
    info!(id = challenge.id, "submitting flag");
    let AttemptResult { status, message } = match client.submit_flag(challenge.id, flag).await? {
        ApiResponse::Ok(result) => result,
        ApiResponse::NotFound(message) | ApiResponse::Error(message) => {
            return Ok(FlagOutcome::Failed { message })
        }
    };

    let outcome = match status {
        SubmissionStatus::Correct => {
            let instance = if challenge.is_container() {
                Some(InstanceManager::new(client).stop(challenge.id).await?)
            } else {
                None
            };
            FlagOutcome::Correct { message, instance }
        }
        SubmissionStatus::Incorrect => FlagOutcome::Incorrect { message },
        SubmissionStatus::AlreadySolved => FlagOutcome::AlreadySolved { message },
        SubmissionStatus::Other(status) => FlagOutcome::Failed {
            message: if message.is_empty() { status } else { message },
        },
    };
    Ok(outcome)
}
