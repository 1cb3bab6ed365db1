//! # Kodegen Release Manager
//!
//! Multi-backend release management: deletes, promotes, and audits
//! releases consistently across the S3 release buckets, the GitHub repo
//! tags, and the ECR image repositories.
//!
//! The three backends are independent and offer no cross-system
//! transactions. Consistency comes from best-effort sequencing, an
//! explicit partial-failure policy (force vs strict), and idempotent
//! per-backend operations, so any interrupted run can be re-run safely.
//!
//! ## Usage
//!
//! ```bash
//! kodegen_release_manager delete-release v0.8.0-rc.3 --force
//! kodegen_release_manager get-release-next-version prerelease v0.8.0-rc.39
//! kodegen_release_manager get-releases --filter incremental
//! kodegen_release_manager promote-release v0.8.0-rc.39
//! kodegen_release_manager create-github-release v0.8.0 v0.8.0
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod status;
pub mod version;

// Re-export main types for public API
pub use artifact::{BucketArtifact, ImageArtifact, TagArtifact};
pub use cli::Args;
pub use config::Config;
pub use error::{BackendError, ConfigError, ReleaseError, Result, VersionError};
pub use orchestrator::{DeleteOutcome, ReleaseOrchestrator};
pub use report::ReleaseFilter;
pub use status::{BackendStatus, StatusChecker};
pub use version::BumpKind;
