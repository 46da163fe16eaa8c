// SPDX-License-Identifier: AGPL-3.0-only
// Copyright Authors of ctfd-cli

use clap_derive::{Args as ArgsGroup, Parser, Subcommand};
use ctfd_common::config::Config;
use ctfd_common::instance::InstanceAction;

/// A command-line client for CTFd platforms
#[derive(Parser, Debug)]
#[command(version, about)]
#[command(propagate_version = true)]
pub(crate) struct Args {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Create the local configuration for a platform
    Init(Init),
    /// Log in with a username and password to create an API token
    GenerateToken(GenerateToken),
    /// Fetch the challenge list from the platform
    Sync(Sync),
    /// Show the synchronized challenges
    List(List),
    /// Download challenge descriptions and files
    Challenges(Challenges),
    /// Submit a flag
    Submit(Submit),
    /// Start, extend or stop the instance of a container challenge
    Instance(Instance),
    /// Show the top of the scoreboard
    Scoreboard(Scoreboard),
    /// Show who solved a challenge
    Solves(Solves),
}

/// Selects a challenge by id or by name. The id wins when both are given.
#[derive(ArgsGroup, Debug, Clone)]
pub(crate) struct ChallengeSelector {
    /// The id of the challenge
    #[arg(long = "challenge-id", short = 'i')]
    pub id: Option<u64>,

    /// The name of the challenge
    #[arg(long = "challenge-name", short = 'n')]
    pub name: Option<String>,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Init {
    /// The API token, prompted for when absent
    #[arg(long)]
    pub token: Option<String>,

    /// Do not ask for a token
    #[arg(long, conflicts_with = "token")]
    pub no_token: bool,

    /// Overwrite an existing configuration
    #[arg(long, short)]
    pub force: bool,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct GenerateToken {
    /// The username or email to log in with
    #[arg(long, short)]
    pub name: String,

    /// The password, prompted for when absent
    #[arg(long, short)]
    pub password: Option<String>,

    /// Replace a token that is already stored
    #[arg(long, short)]
    pub force: bool,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Sync {
    /// Replace the challenges that are already stored
    #[arg(long, short)]
    pub force: bool,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct List {
    /// Only show challenges in this category
    #[arg(long, short)]
    pub category: Option<String>,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Challenges {
    /// Only download challenges in this category
    #[arg(long, short)]
    pub category: Option<String>,

    /// Only download the challenge with this name
    #[arg(long, short)]
    pub name: Option<String>,

    /// Download challenges again even if they were downloaded before
    #[arg(long, short)]
    pub force: bool,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Submit {
    #[command(flatten)]
    pub challenge: ChallengeSelector,

    /// The flag to submit, prompted for when absent
    #[arg(long, short)]
    pub flag: Option<String>,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Instance {
    #[arg(value_enum)]
    pub action: InstanceAction,

    #[command(flatten)]
    pub challenge: ChallengeSelector,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Scoreboard {
    /// The number of teams to show
    #[arg(long, short, default_value_t = 10)]
    pub number: u32,
}

#[derive(ArgsGroup, Debug)]
pub(crate) struct Solves {
    #[command(flatten)]
    pub challenge: ChallengeSelector,
}

#[cfg(test)]
mod tests {
    use super::{Args, Commands};
    use clap::Parser;
    use ctfd_common::instance::InstanceAction;
    use std::path::PathBuf;

    #[test]
    fn should_parse_the_generated_submit_script() {
        let args = Args::try_parse_from([
            "ctfd",
            "--config-dir",
            "/ctf/challenges/.ctfd",
            "submit",
            "--challenge-id",
            "7",
            "--flag",
            "flag{x}",
        ])
        .unwrap();

        assert_eq!(
            args.config.config_dir,
            Some(PathBuf::from("/ctf/challenges/.ctfd"))
        );
        match args.command {
            Commands::Submit(submit) => {
                assert_eq!(submit.challenge.id, Some(7));
                assert_eq!(submit.flag.as_deref(), Some("flag{x}"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn should_leave_the_flag_to_the_prompt() {
        let args = Args::try_parse_from(["ctfd", "submit", "-n", "Baby RE"]).unwrap();

        match args.command {
            Commands::Submit(submit) => {
                assert_eq!(submit.challenge.name.as_deref(), Some("Baby RE"));
                assert_eq!(submit.flag, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn should_parse_the_instance_action() {
        let args =
            Args::try_parse_from(["ctfd", "instance", "extend", "-n", "Web Portal"]).unwrap();

        match args.command {
            Commands::Instance(instance) => {
                assert_eq!(instance.action, InstanceAction::Extend);
                assert_eq!(instance.challenge.name.as_deref(), Some("Web Portal"));
                assert_eq!(instance.challenge.id, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn should_default_the_scoreboard_size() {
        let args = Args::try_parse_from(["ctfd", "scoreboard"]).unwrap();

        assert!(matches!(args.command, Commands::Scoreboard(s) if s.number == 10));
    }

    #[test]
    fn should_reject_a_token_together_with_no_token() {
        let res = Args::try_parse_from(["ctfd", "init", "--token", "abc", "--no-token"]);

        assert!(res.is_err());
    }
}
