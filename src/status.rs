//! Release presence classification across backends.

use crate::artifact::{BucketArtifact, ImageArtifact, TagArtifact};
use crate::error::BackendError;

/// Presence of one release in one backend.
///
/// Deliberately not a boolean: reporting needs "could not tell" kept apart
/// from "definitely absent."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// The backend holds artifacts for the version
    Found,
    /// The backend has no artifacts for the version
    NotFound,
    /// The backend could not be queried
    Error(String),
}

/// Queries every backend for a release version.
///
/// Check order is stable: public bucket, primary repo tag, devops repo
/// tag, node image registry.
pub struct StatusChecker {
    bucket: BucketArtifact,
    primary_tags: TagArtifact,
    devops_tags: TagArtifact,
    node_images: ImageArtifact,
}

impl StatusChecker {
    /// Assemble a checker over the registered backends.
    pub fn new(
        bucket: BucketArtifact,
        primary_tags: TagArtifact,
        devops_tags: TagArtifact,
        node_images: ImageArtifact,
    ) -> Self {
        Self {
            bucket,
            primary_tags,
            devops_tags,
            node_images,
        }
    }

    /// Column labels, in check order.
    pub fn backend_names(&self) -> Vec<String> {
        vec![
            "S3".to_string(),
            format!("GITHUB ({})", self.primary_tags.repo_name()),
            format!("GITHUB ({})", self.devops_tags.repo_name()),
            "ECR".to_string(),
        ]
    }

    /// Classify the version's presence in every backend.
    ///
    /// Never fails: backend errors are captured as
    /// [`BackendStatus::Error`] entries so a listing can render partial
    /// results.
    pub async fn check(&self, version: &str) -> Vec<BackendStatus> {
        vec![
            fold(self.bucket.check(version).await.map(|_| ())),
            fold(self.primary_tags.check(version).await),
            fold(self.devops_tags.check(version).await),
            fold(self.node_images.check(version).await),
        ]
    }
}

fn fold(result: Result<(), BackendError>) -> BackendStatus {
    match result {
        Ok(()) => BackendStatus::Found,
        Err(err) if err.is_not_found() => BackendStatus::NotFound,
        Err(err) => BackendStatus::Error(err.to_string()),
    }
}
