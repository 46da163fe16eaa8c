// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use clap::Args;
use std::path::PathBuf;

/// The file name of the local state document inside the config directory
pub const STORE_FILE_NAME: &str = "config.json";

/// The file name of the location cache inside the temporary directory
pub const CACHE_FILE_NAME: &str = ".ctfd.cache";

const DEFAULT_CONFIG_DIR: &str = ".ctfd";

#[derive(Args, Debug, Clone)]
#[group(skip)]
pub struct Config {
    /// The directory where the local state is stored, relative to the challenges directory
    /// [default: .ctfd]
    #[arg(long, short = 'c')]
    pub config_dir: Option<PathBuf>,

    /// The name of the challenges directory
    #[arg(long, short = 'd', default_value = "challenges")]
    pub dir_name: PathBuf,

    /// Skip checking the connection to the platform
    #[arg(long, short = 's')]
    pub skip: bool,

    /// The URL of the platform
    #[arg(env = "CTFD_URL", long, short = 'u')]
    pub url: Option<String>,

    /// The API token used to talk to the platform
    #[arg(env = "CTFD_TOKEN", long, short = 't', hide_env_values = true)]
    pub token: Option<String>,

    /// The file remembering where the local state lives
    #[arg(env = "CTFD_CACHE_FILE", long, default_value_os_t = default_cache_file())]
    pub cache_file: PathBuf,
}

impl Config {
    /// The config directory as it would be resolved without any location cache. Absolute
    /// `--config-dir` values are used as is.
    pub fn default_store_dir(&self) -> PathBuf {
        let config_dir = self
            .config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        self.dir_name.join(config_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: None,
            dir_name: PathBuf::from("challenges"),
            skip: false,
            url: None,
            token: None,
            cache_file: default_cache_file(),
        }
    }
}

pub fn default_cache_file() -> PathBuf {
    std::env::temp_dir().join(CACHE_FILE_NAME)
}
