//! Error types for release management operations.
//!
//! The split between [`BackendError::NotFound`] and [`BackendError::Command`]
//! is load-bearing: the orchestrator's force policy and the status checker's
//! tri-state classification both hinge on it.

use thiserror::Error;

/// Result type alias for release manager operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all release manager operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Version policy errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Configuration errors, raised before any network call
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend operation errors
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised by the remote backends holding release artifacts.
///
/// Messages always name the backend container (bucket, repo) and the
/// operation that failed, so an operator can resolve and re-run by hand.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The targeted version, tag, or image does not exist in the backend
    #[error("{0}")]
    NotFound(String),

    /// Any unexpected backend or API failure
    #[error("{0}")]
    Command(String),
}

impl BackendError {
    /// Build a `NotFound` error from a message.
    pub fn not_found(message: impl Into<String>) -> Self {
        BackendError::NotFound(message.into())
    }

    /// Build a `Command` error from a message.
    pub fn command(message: impl Into<String>) -> Self {
        BackendError::Command(message.into())
    }

    /// Whether this error reports a missing version rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

/// Version policy errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Input does not parse under the semver grammar
    #[error("Failed to parse version '{version}': {source}")]
    InvalidVersion {
        /// Version string as given
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Bump kind is not applicable to the given version
    #[error("Bump type '{bump}' cannot be used with non-release-candidate version '{version}'")]
    InvalidBump {
        /// Bump kind name
        bump: String,
        /// Version the bump was applied to
        version: String,
    },
}

/// Configuration errors, always reported before any network call
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No GitHub token in the environment
    #[error("GitHub token not provided. Set the GH_TOKEN or GITHUB_TOKEN environment variable.")]
    MissingGithubToken,

    /// No AWS credential source discoverable
    #[error(
        "No AWS credential source found. Set AWS_ACCESS_KEY_ID, AWS_PROFILE, or configure ~/.aws/credentials."
    )]
    MissingAwsCredentials,
}
