//! Object storage adapter for release artifacts in S3.
//!
//! A release lives under the key prefix `"{version}/"` inside a bucket.
//! Copy and sync rewrite that prefix in-bucket; neither touches the source.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use log::debug;

use super::ObjectStoreApi;
use crate::error::BackendError;

/// S3 imposes a 1000-key ceiling per delete-objects request.
const DELETE_BATCH_SIZE: usize = 1000;

/// Interface for working with one release's artifacts in a bucket.
#[derive(Clone)]
pub struct BucketArtifact {
    api: Arc<dyn ObjectStoreApi>,
    bucket: String,
}

impl BucketArtifact {
    /// Create an adapter over `bucket`.
    pub fn new(api: Arc<dyn ObjectStoreApi>, bucket: impl Into<String>) -> Self {
        Self {
            api,
            bucket: bucket.into(),
        }
    }

    /// Name of the bucket this adapter targets.
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// Check that the release exists in the bucket and return its keys.
    ///
    /// An existing bucket with nothing under the version prefix is
    /// `NotFound`, never an empty success.
    pub async fn check(&self, version: &str) -> Result<Vec<String>, BackendError> {
        let keys = self.api.list(&self.bucket, &format!("{version}/")).await?;

        if keys.is_empty() {
            return Err(BackendError::not_found(format!(
                "Release '{version}' not found or has no files in bucket '{}'",
                self.bucket
            )));
        }

        Ok(keys)
    }

    /// Copy the release to a new location within the same bucket.
    ///
    /// The version prefix is rewritten to `to` on every key; the source is
    /// left in place. Overwrite-based, so re-runs are safe.
    pub async fn copy(&self, version: &str, to: &str) -> Result<(), BackendError> {
        for key in self.check(version).await? {
            let dest = key.replacen(version, to, 1);
            self.api.copy(&self.bucket, &key, &dest).await?;
        }
        Ok(())
    }

    /// Sync the release to `to` so the destination exactly mirrors it.
    ///
    /// Copies every source key, then deletes destination keys with no
    /// corresponding source object.
    pub async fn sync(&self, version: &str, to: &str) -> Result<(), BackendError> {
        let source_keys: HashSet<String> = self
            .check(version)
            .await?
            .iter()
            .map(|key| key.replacen(version, to, 1))
            .collect();
        let dest_keys = self.api.list(&self.bucket, &format!("{to}/")).await?;

        self.copy(version, to).await?;

        let stale: Vec<String> = dest_keys
            .into_iter()
            .filter(|key| !source_keys.contains(key))
            .collect();
        if !stale.is_empty() {
            debug!(
                "removing {} stale object(s) under '{to}/' in bucket '{}'",
                stale.len(),
                self.bucket
            );
            self.api.delete_many(&self.bucket, &stale).await?;
        }

        Ok(())
    }

    /// Delete the release from the bucket.
    ///
    /// Preceded by a check so that deleting a missing release reports
    /// `NotFound` instead of silently succeeding.
    pub async fn delete(&self, version: &str) -> Result<(), BackendError> {
        let keys = self.check(version).await?;
        self.api.delete_many(&self.bucket, &keys).await
    }
}

/// [`ObjectStoreApi`] backed by the AWS S3 client.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an S3 client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStoreApi for S3ObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BackendError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| {
                    let service = err.into_service_error();
                    if service.is_no_such_bucket() {
                        BackendError::not_found(format!("Bucket '{bucket}' does not exist"))
                    } else {
                        BackendError::command(format!(
                            "An error occurred listing objects under '{prefix}' in bucket '{bucket}': {service}"
                        ))
                    }
                })?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn copy(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
    ) -> Result<(), BackendError> {
        self.client
            .copy_object()
            .bucket(bucket)
            .copy_source(format!("{bucket}/{src_key}"))
            .key(dst_key)
            .send()
            .await
            .map_err(|err| {
                BackendError::command(format!(
                    "An error occurred copying '{src_key}' to '{dst_key}' in bucket '{bucket}': {}",
                    err.into_service_error()
                ))
            })?;
        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> Result<(), BackendError> {
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects: Vec<ObjectIdentifier> = chunk
                .iter()
                .map(|key| {
                    ObjectIdentifier::builder().key(key).build().map_err(|err| {
                        BackendError::command(format!(
                            "Invalid object key '{key}' in bucket '{bucket}': {err}"
                        ))
                    })
                })
                .collect::<Result<_, _>>()?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|err| {
                    BackendError::command(format!(
                        "Failed to build delete request for bucket '{bucket}': {err}"
                    ))
                })?;

            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| {
                    BackendError::command(format!(
                        "An error occurred deleting objects from bucket '{bucket}': {}",
                        err.into_service_error()
                    ))
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::testing::FakeObjectStore;
    use super::*;

    fn artifact(store: FakeObjectStore) -> BucketArtifact {
        BucketArtifact::new(Arc::new(store), "releases")
    }

    #[tokio::test]
    async fn check_returns_keys_under_version_prefix() {
        let store = FakeObjectStore::with_objects(
            "releases",
            &["v1.0.0/sdk.tar.gz", "v1.0.0/checksums.txt", "v2.0.0/sdk.tar.gz"],
        );
        let keys = artifact(store).check("v1.0.0").await.unwrap();
        assert_eq!(keys, vec!["v1.0.0/checksums.txt", "v1.0.0/sdk.tar.gz"]);
    }

    #[tokio::test]
    async fn check_reports_empty_prefix_as_not_found() {
        let store = FakeObjectStore::with_objects("releases", &["v2.0.0/sdk.tar.gz"]);
        let err = artifact(store).check("v1.0.0").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn check_reports_missing_bucket_as_not_found() {
        let err = artifact(FakeObjectStore::default())
            .check("v1.0.0")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn copy_rewrites_prefix_and_keeps_source() {
        let store = FakeObjectStore::with_objects("releases", &["v1.0.0-rc.1/sdk.tar.gz"]);
        let artifact = artifact(store.clone());

        artifact.copy("v1.0.0-rc.1", "v1.0.0").await.unwrap();

        assert_eq!(
            store.keys("releases"),
            vec!["v1.0.0-rc.1/sdk.tar.gz", "v1.0.0/sdk.tar.gz"]
        );
    }

    #[tokio::test]
    async fn sync_removes_destination_only_keys() {
        let store = FakeObjectStore::with_objects(
            "releases",
            &[
                "v1.0.0/sdk.tar.gz",
                "public/sdk/latest/sdk.tar.gz",
                "public/sdk/latest/stale.txt",
            ],
        );
        let artifact = artifact(store.clone());

        artifact.sync("v1.0.0", "public/sdk/latest").await.unwrap();

        assert_eq!(
            store.keys("releases"),
            vec!["public/sdk/latest/sdk.tar.gz", "v1.0.0/sdk.tar.gz"]
        );
    }

    #[tokio::test]
    async fn delete_removes_all_version_keys() {
        let store = FakeObjectStore::with_objects(
            "releases",
            &["v1.0.0/sdk.tar.gz", "v1.0.0/checksums.txt", "v2.0.0/sdk.tar.gz"],
        );
        let artifact = artifact(store.clone());

        artifact.delete("v1.0.0").await.unwrap();

        assert_eq!(store.keys("releases"), vec!["v2.0.0/sdk.tar.gz"]);
    }

    #[tokio::test]
    async fn delete_of_missing_release_is_not_found() {
        let store = FakeObjectStore::with_objects("releases", &["v2.0.0/sdk.tar.gz"]);
        let err = artifact(store).delete("v1.0.0").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
