//! Environment-derived configuration for backend access.
//!
//! Container names default to the production layout and can be overridden
//! per-environment. Credentials are validated here, before any client is
//! built, so a missing token surfaces as a configuration error rather than
//! a backend failure mid-operation.

use std::env;

use crate::error::ConfigError;

/// Names of the remote containers a release spans, plus the GitHub token.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public releases bucket
    pub public_bucket: String,
    /// Private releases bucket
    pub private_bucket: String,
    /// Primary source repo (owner/name) whose tags define known releases
    pub primary_repo: String,
    /// Devops/tooling repo (owner/name) tagged alongside the primary repo
    pub devops_repo: String,
    /// ECR repository holding node images
    pub node_image_repo: String,
    /// ECR repository holding functional-test images
    pub functional_test_image_repo: String,
    /// GitHub API token
    pub github_token: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Fails when no GitHub token is set or no AWS credential source is
    /// discoverable; both checks run before any network client exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let github_token = env::var("GH_TOKEN")
            .or_else(|_| env::var("GITHUB_TOKEN"))
            .map_err(|_| ConfigError::MissingGithubToken)?;

        ensure_aws_credentials()?;

        Ok(Self {
            public_bucket: env_or("RELEASES_BUCKET", "kodegen-releases"),
            private_bucket: env_or("PRIVATE_RELEASES_BUCKET", "kodegen-private-releases"),
            primary_repo: env_or("RELEASES_REPO", "cyrup-ai/kodegen"),
            devops_repo: env_or("DEVOPS_REPO", "cyrup-ai/kodegen-devops"),
            node_image_repo: env_or("NODE_IMAGE_REPO", "kodegen-node"),
            functional_test_image_repo: env_or(
                "FUNCTIONAL_TEST_IMAGE_REPO",
                "kodegen-functional-tests",
            ),
            github_token,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check that the AWS default credential chain has something to find.
fn ensure_aws_credentials() -> Result<(), ConfigError> {
    const CREDENTIAL_VARS: [&str; 4] = [
        "AWS_ACCESS_KEY_ID",
        "AWS_PROFILE",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
    ];

    if CREDENTIAL_VARS.iter().any(|var| env::var_os(var).is_some()) {
        return Ok(());
    }

    if let Some(home) = dirs::home_dir()
        && home.join(".aws").join("credentials").exists()
    {
        return Ok(());
    }

    Err(ConfigError::MissingAwsCredentials)
}
