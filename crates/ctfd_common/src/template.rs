// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

//! Helper scripts written next to each downloaded challenge.

use std::path::{Path, PathBuf};
use tokio::fs;

const SUBMIT_TEMPLATE: &str = include_str!("../templates/submit.sh");
const LAUNCH_TEMPLATE: &str = include_str!("../templates/launch.sh");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ChallengeId,
    ConfigDir,
}

impl Placeholder {
    pub const ALL: [Placeholder; 2] = [Placeholder::ChallengeId, Placeholder::ConfigDir];

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::ChallengeId => "{CHALLENGE_ID}",
            Placeholder::ConfigDir => "{CONFIG_DIR}",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Substitutions {
    pub challenge_id: u64,
    pub config_dir: PathBuf,
}

impl Substitutions {
    fn value(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::ChallengeId => self.challenge_id.to_string(),
            Placeholder::ConfigDir => self.config_dir.to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Submit,
    /// Only written for container challenges
    Launch,
}

impl Script {
    pub fn file_name(&self) -> &'static str {
        match self {
            Script::Submit => "submit.sh",
            Script::Launch => "launch.sh",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Script::Submit => SUBMIT_TEMPLATE,
            Script::Launch => LAUNCH_TEMPLATE,
        }
    }
}

/// Replaces every known placeholder in `template`. Unknown braces are left alone.
pub fn render(template: &str, values: &Substitutions) -> String {
    Placeholder::ALL
        .iter()
        .fold(template.to_string(), |text, placeholder| {
            text.replace(placeholder.token(), &values.value(*placeholder))
        })
}

/// Writes a rendered script into `dir` and makes it executable.
pub async fn install(
    dir: &Path,
    script: Script,
    values: &Substitutions,
) -> std::io::Result<PathBuf> {
    let path = dir.join(script.file_name());
    fs::write(&path, render(script.template(), values)).await?;
    make_executable(&path).await?;
    Ok(path)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Substitutions {
        Substitutions {
            challenge_id: 42,
            config_dir: PathBuf::from("/home/player/ctf/challenges/.ctfd"),
        }
    }

    #[test]
    fn should_render_every_placeholder() {
        let rendered = render(
            "id={CHALLENGE_ID} dir={CONFIG_DIR} again={CHALLENGE_ID} ${HOME}",
            &values(),
        );
        assert_eq!(
            rendered,
            "id=42 dir=/home/player/ctf/challenges/.ctfd again=42 ${HOME}"
        );
    }

    #[test]
    fn should_leave_no_placeholders_in_templates() {
        for script in [Script::Submit, Script::Launch] {
            let rendered = render(script.template(), &values());
            for placeholder in Placeholder::ALL {
                assert!(!rendered.contains(placeholder.token()));
            }
            assert!(rendered.contains("--challenge-id 42"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn should_install_executable_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = install(dir.path(), Script::Submit, &values()).await.unwrap();

        let mode = fs::metadata(&path).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
