//! Container image registry adapter for release images in ECR.
//!
//! A release version expands to one registry tag per supported
//! architecture (`{version}-{arch}`), and every architecture variant must
//! be processed for a version-level operation to count as complete. ECR
//! tags are always `v`-prefixed, so versions are normalized here even when
//! callers pass the bare form.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_ecr::types::{ImageFailure, ImageFailureCode, ImageIdentifier};
use log::debug;

use super::{ImageManifest, ImageRegistryApi, PutImageOutcome};
use crate::error::BackendError;

/// Interface for working with one logical repo's release images.
#[derive(Clone)]
pub struct ImageArtifact {
    api: Arc<dyn ImageRegistryApi>,
    repo: String,
    architectures: Vec<String>,
}

impl ImageArtifact {
    /// Create an adapter over `repo`, covering the given architecture
    /// suffixes.
    pub fn new(
        api: Arc<dyn ImageRegistryApi>,
        repo: impl Into<String>,
        architectures: &[&str],
    ) -> Self {
        Self {
            api,
            repo: repo.into(),
            architectures: architectures.iter().map(|arch| arch.to_string()).collect(),
        }
    }

    /// Name of the registry repo this adapter targets.
    pub fn repo_name(&self) -> &str {
        &self.repo
    }

    fn tag_for(version: &str, arch: &str) -> String {
        let tag = format!("{version}-{arch}");
        if tag.starts_with('v') {
            tag
        } else {
            format!("v{tag}")
        }
    }

    /// Check that every architecture tag for the release is present.
    pub async fn check(&self, version: &str) -> Result<(), BackendError> {
        for arch in &self.architectures {
            self.api
                .describe_images(&self.repo, &Self::tag_for(version, arch))
                .await?;
        }
        Ok(())
    }

    /// Re-publish every architecture manifest under the destination
    /// version's tags.
    ///
    /// A destination tag already carrying the same digest is accepted as
    /// already-promoted, so re-running after a partial failure is safe. A
    /// destination tag carrying a different digest is a conflict and
    /// fails.
    pub async fn promote(&self, from_version: &str, to_version: &str) -> Result<(), BackendError> {
        for arch in &self.architectures {
            let from_tag = Self::tag_for(from_version, arch);
            let to_tag = Self::tag_for(to_version, arch);

            let image = self.api.batch_get_image(&self.repo, &from_tag).await?;
            match self
                .api
                .put_image(&self.repo, &image.manifest, &image.digest, &to_tag)
                .await?
            {
                PutImageOutcome::Created => {}
                PutImageOutcome::TagAlreadyExists => {
                    debug!(
                        "tag '{to_tag}' already present in repo '{}', leaving it as is",
                        self.repo
                    );
                }
            }
        }
        Ok(())
    }

    /// Delete every architecture tag for the release.
    pub async fn delete(&self, version: &str) -> Result<(), BackendError> {
        let tags: Vec<String> = self
            .architectures
            .iter()
            .map(|arch| Self::tag_for(version, arch))
            .collect();
        self.api.batch_delete_image(&self.repo, &tags).await
    }
}

/// [`ImageRegistryApi`] backed by the AWS ECR client.
#[derive(Clone)]
pub struct EcrImageRegistry {
    client: aws_sdk_ecr::Client,
}

impl EcrImageRegistry {
    /// Wrap an ECR client.
    pub fn new(client: aws_sdk_ecr::Client) -> Self {
        Self { client }
    }
}

/// Fold an ECR failure list into the NotFound/Command split.
///
/// Any `ImageNotFound` failure wins and reports the missing tags; other
/// failure codes are unexpected and surface verbatim.
fn map_failures(repo: &str, failures: &[ImageFailure]) -> Result<(), BackendError> {
    if failures.is_empty() {
        return Ok(());
    }

    let missing: Vec<&str> = failures
        .iter()
        .filter(|failure| {
            matches!(failure.failure_code(), Some(ImageFailureCode::ImageNotFound))
        })
        .filter_map(|failure| failure.image_id().and_then(|id| id.image_tag()))
        .collect();

    if !missing.is_empty() {
        return Err(BackendError::not_found(format!(
            "Image not found in {repo} for tags: {}",
            missing.join(", ")
        )));
    }

    Err(BackendError::command(format!(
        "An unexpected error was present in the response from the registry in repo '{repo}': {failures:?}"
    )))
}

#[async_trait]
impl ImageRegistryApi for EcrImageRegistry {
    async fn describe_images(&self, repo: &str, tag: &str) -> Result<(), BackendError> {
        let output = self
            .client
            .describe_images()
            .repository_name(repo)
            .image_ids(ImageIdentifier::builder().image_tag(tag).build())
            .send()
            .await
            .map_err(|err| {
                let service = err.into_service_error();
                if service.is_image_not_found_exception() {
                    BackendError::not_found(format!(
                        "Image with tag '{tag}' not found in repo '{repo}'"
                    ))
                } else {
                    BackendError::command(format!(
                        "An error occurred describing images from the registry in repo '{repo}' with image tag '{tag}': {service}"
                    ))
                }
            })?;

        if output.image_details().is_empty() {
            return Err(BackendError::command(format!(
                "Images with no image details returned from the registry for repo '{repo}' and image tag '{tag}'"
            )));
        }

        Ok(())
    }

    async fn batch_get_image(
        &self,
        repo: &str,
        tag: &str,
    ) -> Result<ImageManifest, BackendError> {
        let output = self
            .client
            .batch_get_image()
            .repository_name(repo)
            .image_ids(ImageIdentifier::builder().image_tag(tag).build())
            .send()
            .await
            .map_err(|err| {
                BackendError::command(format!(
                    "An error occurred batch getting images from the registry in repo '{repo}' with image tag '{tag}': {}",
                    err.into_service_error()
                ))
            })?;

        map_failures(repo, output.failures())?;

        let images = output.images();
        if images.len() > 1 {
            return Err(BackendError::command(format!(
                "Multiple images returned from batch get for repo '{repo}' and image tag '{tag}'"
            )));
        }

        let image = images.first().ok_or_else(|| {
            BackendError::command(format!(
                "Empty images returned from the registry for repo '{repo}' and image tag '{tag}'"
            ))
        })?;

        let manifest = image.image_manifest().ok_or_else(|| {
            BackendError::command(format!(
                "Image with no manifest returned from the registry for repo '{repo}' and image tag '{tag}'"
            ))
        })?;
        let digest = image
            .image_id()
            .and_then(|id| id.image_digest())
            .ok_or_else(|| {
                BackendError::command(format!(
                    "Image with no digest returned from the registry for repo '{repo}' and image tag '{tag}'"
                ))
            })?;

        Ok(ImageManifest {
            manifest: manifest.to_string(),
            digest: digest.to_string(),
        })
    }

    async fn put_image(
        &self,
        repo: &str,
        manifest: &str,
        digest: &str,
        tag: &str,
    ) -> Result<PutImageOutcome, BackendError> {
        match self
            .client
            .put_image()
            .repository_name(repo)
            .image_manifest(manifest)
            .image_digest(digest)
            .image_tag(tag)
            .send()
            .await
        {
            Ok(_) => Ok(PutImageOutcome::Created),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_image_already_exists_exception() {
                    Ok(PutImageOutcome::TagAlreadyExists)
                } else if service.is_image_tag_already_exists_exception() {
                    Err(BackendError::command(format!(
                        "Tag '{tag}' already exists in repo '{repo}' with a different image digest"
                    )))
                } else {
                    Err(BackendError::command(format!(
                        "An error occurred putting an image via the registry in repo '{repo}' with image tag '{tag}': {service}"
                    )))
                }
            }
        }
    }

    async fn batch_delete_image(&self, repo: &str, tags: &[String]) -> Result<(), BackendError> {
        let image_ids: Vec<ImageIdentifier> = tags
            .iter()
            .map(|tag| ImageIdentifier::builder().image_tag(tag).build())
            .collect();

        let output = self
            .client
            .batch_delete_image()
            .repository_name(repo)
            .set_image_ids(Some(image_ids))
            .send()
            .await
            .map_err(|err| {
                BackendError::command(format!(
                    "An error occurred batch deleting images from the registry in repo '{repo}' with image tags '{}': {}",
                    tags.join(", "),
                    err.into_service_error()
                ))
            })?;

        map_failures(repo, output.failures())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::FakeImageRegistry;
    use super::*;

    fn artifact(registry: FakeImageRegistry) -> ImageArtifact {
        ImageArtifact::new(Arc::new(registry), "kodegen-node", &["amd64", "arm64"])
    }

    #[tokio::test]
    async fn check_requires_every_architecture_tag() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[("v1.0.0-amd64", "sha256:aa")],
        );
        let err = artifact(registry).check("v1.0.0").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn check_normalizes_bare_versions_to_v_prefixed_tags() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[("v1.0.0-amd64", "sha256:aa"), ("v1.0.0-arm64", "sha256:bb")],
        );
        artifact(registry).check("1.0.0").await.unwrap();
    }

    #[tokio::test]
    async fn promote_republishes_every_architecture() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[
                ("v1.0.0-rc.1-amd64", "sha256:aa"),
                ("v1.0.0-rc.1-arm64", "sha256:bb"),
            ],
        );
        let artifact = artifact(registry.clone());

        artifact.promote("v1.0.0-rc.1", "v1.0.0").await.unwrap();

        assert_eq!(
            registry.digest("kodegen-node", "v1.0.0-amd64").as_deref(),
            Some("sha256:aa")
        );
        assert_eq!(
            registry.digest("kodegen-node", "v1.0.0-arm64").as_deref(),
            Some("sha256:bb")
        );
    }

    #[tokio::test]
    async fn promote_accepts_existing_destination_tag_with_same_digest() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[
                ("v1.0.0-rc.1-amd64", "sha256:aa"),
                ("v1.0.0-rc.1-arm64", "sha256:bb"),
            ],
        );
        let artifact = artifact(registry.clone());

        artifact.promote("v1.0.0-rc.1", "v1.0.0").await.unwrap();
        artifact.promote("v1.0.0-rc.1", "v1.0.0").await.unwrap();
    }

    #[tokio::test]
    async fn promote_rejects_destination_tag_with_different_digest() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[
                ("v1.0.0-rc.1-amd64", "sha256:aa"),
                ("v1.0.0-rc.1-arm64", "sha256:bb"),
                ("v1.0.0-amd64", "sha256:other"),
            ],
        );
        let err = artifact(registry)
            .promote("v1.0.0-rc.1", "v1.0.0")
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn promote_of_missing_source_is_not_found() {
        let registry = FakeImageRegistry::with_images("kodegen-node", &[]);
        let err = artifact(registry)
            .promote("v1.0.0-rc.1", "v1.0.0")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_every_architecture_tag() {
        let registry = FakeImageRegistry::with_images(
            "kodegen-node",
            &[("v1.0.0-amd64", "sha256:aa"), ("v1.0.0-arm64", "sha256:bb")],
        );
        let artifact = artifact(registry.clone());

        artifact.delete("v1.0.0").await.unwrap();

        assert!(registry.tags("kodegen-node").is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_release_is_not_found() {
        let registry = FakeImageRegistry::with_images("kodegen-node", &[]);
        let err = artifact(registry).delete("v1.0.0").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
