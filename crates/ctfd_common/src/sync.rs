// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use crate::assets;
use crate::client::CtfdClient;
use crate::error::{ClientError, StoreError};
use crate::models::responses::ApiResponse;
use crate::models::{Challenge, RemoteChallenge};
use crate::store::{LocalStore, Section, WriteMode};
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("challenges already exist in the configuration file, use --force to refetch them")]
    AlreadySynced,
    #[error("the platform refused to list the challenges: {0}")]
    Remote(String),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Replaces the stored challenge list with the remote one.
///
/// An existing list is only replaced when `force` is set. Download flags are never carried over
/// from the old list; they are recomputed from the marker files under `root`.
pub async fn synchronize(
    client: &CtfdClient,
    store: &LocalStore,
    root: &Path,
    force: bool,
) -> Result<Vec<Challenge>, SyncError> {
    if store.load().await.has_challenges() && !force {
        return Err(SyncError::AlreadySynced);
    }

    info!("fetching all the challenges deployed on the platform");
    let remote = match client.get_challenges().await? {
        ApiResponse::Ok(remote) => remote,
        ApiResponse::NotFound(message) | ApiResponse::Error(message) => {
            return Err(SyncError::Remote(message))
        }
    };

    let challenges = reconcile(remote, root).await;
    store
        .save(Section::Challenges, &challenges, WriteMode::Merge)
        .await?;

    info!(count = challenges.len(), "synchronized challenges");
    Ok(challenges)
}

/// Converts the remote entries and marks those whose marker file exists under `root`.
pub async fn reconcile(remote: Vec<RemoteChallenge>, root: &Path) -> Vec<Challenge> {
    let mut challenges = Vec::with_capacity(remote.len());
    for entry in remote {
        let mut challenge = Challenge::from(entry);
        let marker = assets::marker_path(root, &challenge.category, &challenge.name);
        if fs::try_exists(&marker).await.unwrap_or(false) {
            debug!(id = challenge.id, marker = %marker.display(), "found downloaded challenge");
            challenge.is_downloaded = true;
        }
        challenges.push(challenge);
    }
    challenges
}
