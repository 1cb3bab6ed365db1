//! Command line argument parsing and validation.

use clap::{ArgAction, Parser, Subcommand};

use crate::report::ReleaseFilter;
use crate::version::BumpKind;

/// A tool for release management
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_release_manager",
    version,
    about = "A tool for release management",
    long_about = "Deletes, promotes, and audits releases across the S3 release \
buckets, the GitHub repos, and the ECR image repos."
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Release management commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a GitHub release
    CreateGithubRelease {
        /// Name of existing tag
        tag_name: String,
        /// Name to give release
        release_name: String,
    },

    /// Delete a release
    DeleteRelease {
        /// Release version to delete
        release_version: String,
        /// Ignore errors from intermediate deletion steps
        #[arg(long, action = ArgAction::SetTrue, overrides_with = "no_force")]
        force: bool,
        /// Abort on the first failing deletion step (default)
        #[arg(long, action = ArgAction::SetTrue, overrides_with = "force")]
        no_force: bool,
    },

    /// Gets next version for release
    GetReleaseNextVersion {
        /// Type of version bump
        #[arg(value_enum)]
        bump_type: BumpKind,
        /// Version to bump
        latest_version: String,
        /// Base version from which next version should be derived
        #[arg(long)]
        release_candidate_base_version: Option<String>,
    },

    /// Get releases
    GetReleases {
        /// Filter releases by the release type
        #[arg(long, value_enum, default_value = "all")]
        filter: ReleaseFilter,
    },

    /// Promote a release
    PromoteRelease {
        /// Release version to promote
        from_version: String,
        /// Release version to promote to (computed when omitted or empty)
        to_version: Option<String>,
    },
}

impl Command {
    /// Kebab-case command name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateGithubRelease { .. } => "create-github-release",
            Command::DeleteRelease { .. } => "delete-release",
            Command::GetReleaseNextVersion { .. } => "get-release-next-version",
            Command::GetReleases { .. } => "get-releases",
            Command::PromoteRelease { .. } => "promote-release",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_defaults_off_and_no_force_wins_last() {
        let args = Args::try_parse_from(["rm", "delete-release", "v1.0.0"]).unwrap();
        match args.command {
            Command::DeleteRelease { force, .. } => assert!(!force),
            other => panic!("unexpected command {other:?}"),
        }

        let args =
            Args::try_parse_from(["rm", "delete-release", "v1.0.0", "--force", "--no-force"])
                .unwrap();
        match args.command {
            Command::DeleteRelease { force, .. } => assert!(!force),
            other => panic!("unexpected command {other:?}"),
        }

        let args = Args::try_parse_from(["rm", "delete-release", "v1.0.0", "--force"]).unwrap();
        match args.command {
            Command::DeleteRelease { force, .. } => assert!(force),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn promote_release_to_version_is_optional() {
        let args = Args::try_parse_from(["rm", "promote-release", "v1.0.0-rc.1"]).unwrap();
        match args.command {
            Command::PromoteRelease { to_version, .. } => assert!(to_version.is_none()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bump_type_rejects_unknown_values() {
        assert!(Args::try_parse_from(["rm", "get-release-next-version", "hotfix", "v1.0.0"]).is_err());
    }
}
