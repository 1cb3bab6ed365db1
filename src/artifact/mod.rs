//! Backend adapters for the remote systems holding release artifacts.
//!
//! Each backend is reached through a narrow API trait mirroring the remote
//! contract, with one concrete client per trait. The adapters layered on
//! top share the same capability set over different remote systems: locate
//! a version's artifacts, copy them to a new version, and delete them.
//! All operations are individually idempotent.

mod ecr;
mod github;
mod s3;

#[cfg(test)]
pub(crate) mod testing;

pub use ecr::{EcrImageRegistry, ImageArtifact};
pub use github::{GithubTagRegistry, TagArtifact};
pub use s3::{BucketArtifact, S3ObjectStore};

use async_trait::async_trait;

use crate::error::BackendError;

/// Object storage operations the bucket adapter consumes.
#[async_trait]
pub trait ObjectStoreApi: Send + Sync {
    /// List every key under `prefix`. A missing bucket is `NotFound`; an
    /// existing bucket with nothing under the prefix is an empty list.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BackendError>;

    /// Copy one object to a new key within the same bucket.
    async fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), BackendError>;

    /// Delete the given keys from the bucket.
    async fn delete_many(&self, bucket: &str, keys: &[String]) -> Result<(), BackendError>;
}

/// Tag and release operations the tag registry adapter consumes.
#[async_trait]
pub trait TagRegistryApi: Send + Sync {
    /// Resolve a tag ref; `Ok(None)` when the remote reports it missing.
    async fn get_tag_ref(&self, repo: &str, tag: &str) -> Result<Option<String>, BackendError>;

    /// Delete a tag ref that is known to exist.
    async fn delete_ref(&self, repo: &str, tag: &str) -> Result<(), BackendError>;

    /// List every tag name in the repo.
    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, BackendError>;

    /// Tag name of the most recently created release, if any exists.
    async fn latest_release(&self, repo: &str) -> Result<Option<String>, BackendError>;

    /// Generate release notes for `tag` relative to `previous_tag`.
    async fn generate_release_notes(
        &self,
        repo: &str,
        previous_tag: &str,
        tag: &str,
    ) -> Result<String, BackendError>;

    /// Create a release named `name` pointing at the existing `tag`.
    async fn create_release(
        &self,
        repo: &str,
        tag: &str,
        name: &str,
        notes: &str,
        prerelease: bool,
    ) -> Result<(), BackendError>;
}

/// Container image registry operations the image adapter consumes.
#[async_trait]
pub trait ImageRegistryApi: Send + Sync {
    /// Check that an image exists under `tag`.
    async fn describe_images(&self, repo: &str, tag: &str) -> Result<(), BackendError>;

    /// Fetch the manifest and digest published under `tag`.
    async fn batch_get_image(&self, repo: &str, tag: &str) -> Result<ImageManifest, BackendError>;

    /// Re-publish a manifest under a new tag.
    async fn put_image(
        &self,
        repo: &str,
        manifest: &str,
        digest: &str,
        tag: &str,
    ) -> Result<PutImageOutcome, BackendError>;

    /// Delete every given tag from the repo.
    async fn batch_delete_image(&self, repo: &str, tags: &[String]) -> Result<(), BackendError>;
}

/// Manifest and digest identifying one published image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageManifest {
    /// Raw manifest document
    pub manifest: String,
    /// Content digest of the manifest
    pub digest: String,
}

/// Result of re-publishing a manifest under a destination tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutImageOutcome {
    /// The tag was created
    Created,
    /// The tag already carried this exact manifest; nothing to do
    TagAlreadyExists,
}
