//! Multi-backend release orchestration.
//!
//! Delete and promote are sequential pipelines of steps, each targeting
//! exactly one backend. The backends are independent and offer no
//! transactions, so ordering plus per-step idempotence is the whole
//! consistency story: a run interrupted mid-sequence is recovered by
//! re-running the same operation, or by a forced delete.

use log::debug;

use crate::artifact::{BucketArtifact, ImageArtifact, TagArtifact};
use crate::cli::OutputManager;
use crate::error::{BackendError, Result};
use crate::version::{BumpKind, is_release_candidate, next_version, parse_version};

/// Fixed alias path a promoted release's public artifacts are published
/// under.
const PUBLIC_SDK_PREFIX: &str = "public/sdk";

/// Outcome of a delete operation.
///
/// In force mode, failed steps are recorded here instead of aborting the
/// pipeline; an empty list means every step succeeded.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    /// Failure messages for steps that were skipped past
    pub failures: Vec<String>,
}

/// Sequences delete/promote operations across every backend.
pub struct ReleaseOrchestrator {
    public_bucket: BucketArtifact,
    private_bucket: BucketArtifact,
    primary_tags: TagArtifact,
    devops_tags: TagArtifact,
    node_images: ImageArtifact,
    functional_test_images: ImageArtifact,
    output: OutputManager,
}

impl ReleaseOrchestrator {
    /// Assemble an orchestrator over the six backend adapters.
    pub fn new(
        public_bucket: BucketArtifact,
        private_bucket: BucketArtifact,
        primary_tags: TagArtifact,
        devops_tags: TagArtifact,
        node_images: ImageArtifact,
        functional_test_images: ImageArtifact,
        output: OutputManager,
    ) -> Self {
        Self {
            public_bucket,
            private_bucket,
            primary_tags,
            devops_tags,
            node_images,
            functional_test_images,
            output,
        }
    }

    /// Delete a release from every backend.
    ///
    /// Without force, the first failing step aborts the pipeline and its
    /// error is returned. With force, failures are logged and recorded in
    /// the outcome while the remaining steps still run.
    pub async fn delete_release(&self, version: &str, force: bool) -> Result<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();

        for bucket in [&self.public_bucket, &self.private_bucket] {
            let result = bucket.delete(version).await;
            self.finish_step(
                result,
                &format!(
                    "Release has been deleted from S3 bucket '{}'",
                    bucket.bucket_name()
                ),
                &format!(
                    "Error deleting release from S3 bucket '{}'",
                    bucket.bucket_name()
                ),
                force,
                &mut outcome,
            )?;
        }

        for tags in [&self.primary_tags, &self.devops_tags] {
            let result = tags.delete_ref(version).await;
            self.finish_step(
                result,
                &format!(
                    "Release tag has been deleted from GitHub repo '{}'",
                    tags.repo_name()
                ),
                &format!("Error deleting tag from GitHub repo '{}'", tags.repo_name()),
                force,
                &mut outcome,
            )?;
        }

        for (images, label) in [
            (&self.node_images, "node "),
            (&self.functional_test_images, "functional-test "),
        ] {
            let result = images.delete(version).await;
            self.finish_step(
                result,
                &format!(
                    "Release {label}Docker image has been deleted from ECR repo '{}'",
                    images.repo_name()
                ),
                &format!(
                    "Error deleting Docker image from ECR repo '{}'",
                    images.repo_name()
                ),
                force,
                &mut outcome,
            )?;
        }

        self.output
            .println(&format!("Release '{version}' has been deleted."));
        Ok(outcome)
    }

    /// Promote a release, optionally renaming it to `to_version`.
    ///
    /// When `to_version` is absent or empty it is computed with the
    /// `promote` bump. There is no force mode: a partially-promoted
    /// release is worse than a hard stop, so the first failure aborts.
    /// Every step is overwrite-based, making a re-run after partial
    /// failure safe.
    ///
    /// Returns the resolved destination version.
    pub async fn promote_release(
        &self,
        from_version: &str,
        to_version: Option<&str>,
    ) -> Result<String> {
        let to_version = match to_version.filter(|version| !version.is_empty()) {
            Some(version) => version.to_string(),
            None => next_version(BumpKind::Promote, from_version, None)?,
        };
        debug!("promoting release {from_version} to {to_version}");

        self.private_bucket.copy(from_version, &to_version).await?;
        self.output.success(&format!(
            "Release {from_version} has been promoted to {to_version} in S3 bucket '{}'",
            self.private_bucket.bucket_name()
        ));

        self.public_bucket.copy(from_version, &to_version).await?;
        self.output.success(&format!(
            "Release {from_version} has been promoted to {to_version} in S3 bucket '{}'",
            self.public_bucket.bucket_name()
        ));

        let sdk_path = format!("{PUBLIC_SDK_PREFIX}/{to_version}");
        self.public_bucket.copy(from_version, &sdk_path).await?;
        self.output.success(&format!(
            "Release {to_version} has been published to '{sdk_path}' in S3 bucket '{}'",
            self.public_bucket.bucket_name()
        ));

        let latest_path = format!("{PUBLIC_SDK_PREFIX}/latest");
        self.public_bucket.sync(from_version, &latest_path).await?;
        self.output.success(&format!(
            "Release {to_version} has been published to '{latest_path}' in S3 bucket '{}'",
            self.public_bucket.bucket_name()
        ));

        self.node_images.promote(from_version, &to_version).await?;
        self.output.success(&format!(
            "Release node Docker image {from_version} has been promoted to {to_version}"
        ));

        self.functional_test_images
            .promote(from_version, &to_version)
            .await?;
        self.output.success(&format!(
            "Release functional-test Docker image {from_version} has been promoted to {to_version}"
        ));

        self.output.println(&format!(
            "Release {from_version} has been promoted to {to_version}."
        ));
        Ok(to_version)
    }

    /// Create a GitHub release `release_name` from the existing
    /// `tag_name` in the primary repo.
    pub async fn create_github_release(
        &self,
        tag_name: &str,
        release_name: &str,
    ) -> Result<()> {
        let version = parse_version(release_name)?;
        let prerelease = is_release_candidate(&version);

        self.output.println(&format!(
            "Creating GitHub {}release {release_name} from tag {tag_name}",
            if prerelease { "pre-" } else { "" }
        ));

        self.primary_tags
            .create_release(tag_name, release_name, prerelease)
            .await?;
        self.output.success(&format!(
            "GitHub release {release_name} has been created in repo '{}'",
            self.primary_tags.repo_name()
        ));
        Ok(())
    }

    /// Resolve one step's result against the force policy.
    ///
    /// Success prints the step's confirmation line. A failure under force
    /// is logged and recorded; otherwise it aborts the pipeline.
    fn finish_step(
        &self,
        result: std::result::Result<(), BackendError>,
        success: &str,
        failure: &str,
        force: bool,
        outcome: &mut DeleteOutcome,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                self.output.success(success);
                Ok(())
            }
            Err(err) if force => {
                let message = format!("{failure}: {err}");
                self.output.error(&message);
                outcome.failures.push(message);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
