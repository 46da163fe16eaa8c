// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! The local state document and where it lives.
//!
//! The document is a JSON object with a `CTFD` section holding the platform URL and token, and a
//! `Challenges` section holding the last synchronized challenge list. Every write is a full
//! read-modify-write of the file. Concurrent invocations are not guarded against; the last write
//! wins.

use crate::config::{Config, STORE_FILE_NAME};
use crate::error::{LookupError, StoreError};
use crate::models::Challenge;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Ctfd,
    Challenges,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Ctfd => "CTFD",
            Section::Challenges => "Challenges",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The document becomes `{section: value}`. Only used for first-time initialization.
    Replace,
    /// The section is set on the current document, every other section is kept.
    Merge,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "TOKEN", default, deserialize_with = "null_as_empty")]
    pub token: String,
}

/// The parsed local state. An empty document means "uninitialized".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalState {
    document: Map<String, Value>,
}

impl LocalState {
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn section(&self, section: Section) -> Option<&Value> {
        self.document.get(section.key())
    }

    pub fn session(&self) -> Option<SessionSection> {
        let value = self.section(Section::Ctfd)?;
        match serde_json::from_value(value.clone()) {
            Ok(session) => Some(session),
            Err(error) => {
                warn! {
                    %error,
                    "ignoring malformed CTFD section"
                }
                None
            }
        }
    }

    pub fn challenges(&self) -> Vec<Challenge> {
        let Some(value) = self.section(Section::Challenges) else {
            return Vec::new();
        };
        match serde_json::from_value(value.clone()) {
            Ok(challenges) => challenges,
            Err(error) => {
                warn! {
                    %error,
                    "ignoring malformed Challenges section"
                }
                Vec::new()
            }
        }
    }

    pub fn has_challenges(&self) -> bool {
        !self.challenges().is_empty()
    }

    /// Looks up a stored challenge. The id wins when both an id and a name are given, since names
    /// are only unique within a category.
    pub fn find_challenge(
        &self,
        id: Option<u64>,
        name: Option<&str>,
    ) -> Result<Challenge, LookupError> {
        let challenges = self.challenges();
        match (id, name) {
            (Some(id), _) => challenges
                .into_iter()
                .find(|challenge| challenge.id == id)
                .ok_or(LookupError::UnknownId(id)),
            (None, Some(name)) => challenges
                .into_iter()
                .find(|challenge| challenge.name == name)
                .ok_or_else(|| LookupError::UnknownName(name.to_string())),
            (None, None) => Err(LookupError::NoSelector),
        }
    }
}

impl From<Map<String, Value>> for LocalState {
    fn from(document: Map<String, Value>) -> Self {
        Self { document }
    }
}

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Reads the document. A missing or unparsable file yields an empty state.
    pub async fn load(&self) -> LocalState {
        let content = match fs::read(&self.path).await {
            Ok(content) => content,
            Err(error) => {
                debug! {
                    path = %self.path.display(),
                    %error,
                    "no local state"
                }
                return LocalState::default();
            }
        };

        match serde_json::from_slice::<Map<String, Value>>(&content) {
            Ok(document) => LocalState { document },
            Err(error) => {
                warn! {
                    path = %self.path.display(),
                    %error,
                    "the local state is not valid JSON, treating it as empty"
                }
                LocalState::default()
            }
        }
    }

    pub async fn save<T: Serialize + ?Sized>(
        &self,
        section: Section,
        value: &T,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut document = match mode {
            WriteMode::Replace => Map::new(),
            WriteMode::Merge => self.load().await.document,
        };
        document.insert(section.key().to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(&document)?;
        fs::write(&self.path, content).await?;

        debug! {
            path = %self.path.display(),
            section = section.key(),
            ?mode,
            "saved local state"
        }
        Ok(())
    }

    /// Sets `is_downloaded` on the stored challenge with the given id. Returns whether the
    /// challenge was found.
    pub async fn mark_downloaded(&self, id: u64) -> Result<bool, StoreError> {
        let mut challenges = self.load().await.challenges();
        let Some(challenge) = challenges.iter_mut().find(|challenge| challenge.id == id) else {
            return Ok(false);
        };
        challenge.is_downloaded = true;

        self.save(Section::Challenges, &challenges, WriteMode::Merge)
            .await?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Explicit,
    Cached,
    Default,
}

/// The directory holding the local state, and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub dir: PathBuf,
    pub source: LocationSource,
}

impl StoreLocation {
    /// Resolves the store directory: an explicit `--config-dir`, then the location cache, then the
    /// default directory if a store exists there. `None` means uninitialized.
    pub async fn resolve(config: &Config) -> Option<Self> {
        if config.config_dir.is_some() {
            return Some(Self {
                dir: absolute(config.default_store_dir()),
                source: LocationSource::Explicit,
            });
        }

        if let Some(dir) = read_cached_location(&config.cache_file).await {
            if fs::try_exists(dir.join(STORE_FILE_NAME)).await.unwrap_or(false) {
                return Some(Self {
                    dir,
                    source: LocationSource::Cached,
                });
            }
            warn! {
                cache = %config.cache_file.display(),
                dir = %dir.display(),
                "ignoring a cached location without local state"
            }
        }

        let dir = config.default_store_dir();
        if fs::try_exists(dir.join(STORE_FILE_NAME)).await.unwrap_or(false) {
            return Some(Self {
                dir: absolute(dir),
                source: LocationSource::Default,
            });
        }

        None
    }

    /// The location a new store is created at. The location cache is not consulted.
    pub fn for_init(config: &Config) -> Self {
        let source = match config.config_dir {
            Some(_) => LocationSource::Explicit,
            None => LocationSource::Default,
        };
        Self {
            dir: absolute(config.default_store_dir()),
            source,
        }
    }

    /// The challenges directory is the parent of the store directory.
    pub fn challenges_root(&self) -> PathBuf {
        self.dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir.clone())
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(&self.dir)
    }

    /// Records this location in the cache file so nested working directories find it.
    pub async fn remember(&self, cache_file: &Path) -> Result<(), StoreError> {
        fs::write(cache_file, self.dir.to_string_lossy().as_bytes()).await?;
        Ok(())
    }
}

async fn read_cached_location(cache_file: &Path) -> Option<PathBuf> {
    let content = fs::read_to_string(cache_file).await.ok()?;
    let path = content.trim();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
