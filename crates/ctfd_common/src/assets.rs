// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! Writes a challenge's description, attachments and helper scripts to disk.
//!
//! The layout is `<root>/<category>/<normalized name>/`. The `README.md` in that folder doubles as
//! the marker file: it is written last, so its presence means the whole sequence completed.

use crate::client::download::{file_name_from_url, DownloadProgress, DownloadReport};
use crate::client::CtfdClient;
use crate::error::{ClientError, StoreError};
use crate::models::responses::ApiResponse;
use crate::models::{Challenge, ChallengeDetail, ChallengeType};
use crate::store::LocalStore;
use crate::template::{self, Script, Substitutions};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

pub const MARKER_FILE_NAME: &str = "README.md";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("challenge {id} was not found on the platform: {message}")]
    NotFound { id: u64, message: String },
    #[error("the platform refused to return challenge {id}: {message}")]
    Remote { id: u64, message: String },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unable to write the challenge files: {0}")]
    Io(#[from] std::io::Error),
}

/// Creates a progress receiver for every attachment.
pub trait ProgressFactory {
    fn for_file(&self, file_name: &str) -> Box<dyn DownloadProgress>;
}

impl ProgressFactory for () {
    fn for_file(&self, _file_name: &str) -> Box<dyn DownloadProgress> {
        Box::new(())
    }
}

#[derive(Debug)]
pub struct DownloadedChallenge {
    pub dir: PathBuf,
    pub files: Vec<DownloadReport>,
    pub scripts: Vec<PathBuf>,
}

/// Lowercases the name and replaces spaces with dashes.
pub fn challenge_dir_name(name: &str) -> String {
    path_component(&name.trim().replace(' ', "-").to_lowercase())
}

/// Keeps a remote value to a single path component below the challenges root.
fn path_component(value: &str) -> String {
    let component = value.trim().replace(['/', '\\'], "-");
    if component.is_empty() {
        "_".to_string()
    } else if component == "." || component == ".." {
        component.replace('.', "_")
    } else {
        component
    }
}

pub fn challenge_dir(root: &Path, category: &str, name: &str) -> PathBuf {
    root.join(path_component(category)).join(challenge_dir_name(name))
}

pub fn marker_path(root: &Path, category: &str, name: &str) -> PathBuf {
    challenge_dir(root, category, name).join(MARKER_FILE_NAME)
}

/// Downloads one challenge and marks it as downloaded in `store`. Attachments are fetched one
/// at a time. A failure part-way leaves the written files in place; a retry overwrites them.
pub async fn download_challenge(
    client: &CtfdClient,
    store: &LocalStore,
    challenge: &Challenge,
    root: &Path,
    config_dir: &Path,
    progress: &dyn ProgressFactory,
) -> Result<DownloadedChallenge, AssetError> {
    let detail = match client.get_challenge(challenge.id).await? {
        ApiResponse::Ok(detail) => detail,
        ApiResponse::NotFound(message) => {
            return Err(AssetError::NotFound {
                id: challenge.id,
                message,
            })
        }
        ApiResponse::Error(message) => {
            return Err(AssetError::Remote {
                id: challenge.id,
                message,
            })
        }
    };

    let dir = challenge_dir(root, &detail.category, &detail.name);
    fs::create_dir_all(&dir).await?;

    let mut files = Vec::with_capacity(detail.files.len());
    for endpoint in &detail.files {
        let Some(file_name) = file_name_from_url(endpoint) else {
            warn!(%endpoint, "skipping an attachment without a file name");
            continue;
        };
        info!(%file_name, challenge = %challenge, "downloading challenge file");

        let progress = progress.for_file(&file_name);
        let report = client
            .download_file(endpoint, dir.join(&file_name), progress.as_ref())
            .await?;
        files.push(report);
    }

    let values = Substitutions {
        challenge_id: challenge.id,
        config_dir: config_dir.to_path_buf(),
    };
    let mut scripts = vec![template::install(&dir, Script::Submit, &values).await?];
    if challenge.is_container() || detail.kind == ChallengeType::Container {
        scripts.push(template::install(&dir, Script::Launch, &values).await?);
    }

    fs::write(dir.join(MARKER_FILE_NAME), render_readme(&detail, &files)).await?;

    if !store.mark_downloaded(challenge.id).await? {
        warn!(id = challenge.id, "the challenge is missing from the local state");
    }

    Ok(DownloadedChallenge {
        dir,
        files,
        scripts,
    })
}

pub fn render_readme(detail: &ChallengeDetail, files: &[DownloadReport]) -> String {
    let mut readme = String::new();
    let points = detail
        .value
        .map(|value| value.to_string())
        .unwrap_or_default();

    // Writing to a String cannot fail
    let _ = writeln!(readme, "# {}\n", detail.name);
    let _ = writeln!(readme, "**Category**: {}", detail.category);
    let _ = writeln!(readme, "**Points**: {points}");
    let _ = writeln!(
        readme,
        "**Description**:\n```md\n{}\n```",
        detail.description.trim_end()
    );
    if let Some(connection_info) = detail.connection_info.as_deref().filter(|c| !c.is_empty()) {
        let _ = writeln!(readme, "**Connection**: `{connection_info}`");
    }
    if !files.is_empty() {
        let _ = writeln!(readme, "**Files**:");
        for file in files {
            let name = file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let _ = writeln!(readme, "- [{name}](./{name})");
        }
    }
    readme
}
