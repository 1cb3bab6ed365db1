//! In-memory fakes of the backend API traits, shared across test modules.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ImageManifest, ImageRegistryApi, ObjectStoreApi, PutImageOutcome, TagRegistryApi};
use crate::error::BackendError;

/// Bucket-keyed object sets behind the [`ObjectStoreApi`] contract.
#[derive(Clone, Default)]
pub(crate) struct FakeObjectStore {
    buckets: Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>,
}

impl FakeObjectStore {
    pub(crate) fn with_objects(bucket: &str, keys: &[&str]) -> Self {
        let store = Self::default();
        store.add_bucket(bucket, keys);
        store
    }

    pub(crate) fn add_bucket(&self, bucket: &str, keys: &[&str]) {
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), keys.iter().map(|key| key.to_string()).collect());
    }

    pub(crate) fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStoreApi for FakeObjectStore {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BackendError> {
        let buckets = self.buckets.lock().unwrap();
        let keys = buckets
            .get(bucket)
            .ok_or_else(|| BackendError::not_found(format!("Bucket '{bucket}' does not exist")))?;
        Ok(keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn copy(
        &self,
        bucket: &str,
        src_key: &str,
        dst_key: &str,
    ) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock().unwrap();
        let keys = buckets
            .get_mut(bucket)
            .ok_or_else(|| BackendError::not_found(format!("Bucket '{bucket}' does not exist")))?;
        if !keys.contains(src_key) {
            return Err(BackendError::not_found(format!(
                "Object '{src_key}' not found in bucket '{bucket}'"
            )));
        }
        keys.insert(dst_key.to_string());
        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock().unwrap();
        let existing = buckets
            .get_mut(bucket)
            .ok_or_else(|| BackendError::not_found(format!("Bucket '{bucket}' does not exist")))?;
        for key in keys {
            existing.remove(key);
        }
        Ok(())
    }
}

/// Repo-keyed tag sets behind the [`TagRegistryApi`] contract.
#[derive(Clone, Default)]
pub(crate) struct FakeTagRegistry {
    repos: Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>,
    releases: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeTagRegistry {
    pub(crate) fn with_tags(repo: &str, tags: &[&str]) -> Self {
        let registry = Self::default();
        registry.add_repo(repo, tags);
        registry
    }

    pub(crate) fn add_repo(&self, repo: &str, tags: &[&str]) {
        self.repos
            .lock()
            .unwrap()
            .insert(repo.to_string(), tags.iter().map(|tag| tag.to_string()).collect());
    }

    pub(crate) fn tags(&self, repo: &str) -> Vec<String> {
        self.repos
            .lock()
            .unwrap()
            .get(repo)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Seed an already-created release, newest last.
    pub(crate) fn push_release(&self, repo: &str, tag: &str) {
        self.releases
            .lock()
            .unwrap()
            .push((repo.to_string(), tag.to_string()));
    }

    pub(crate) fn created_releases(&self) -> Vec<(String, String)> {
        self.releases.lock().unwrap().clone()
    }
}

#[async_trait]
impl TagRegistryApi for FakeTagRegistry {
    async fn get_tag_ref(&self, repo: &str, tag: &str) -> Result<Option<String>, BackendError> {
        let repos = self.repos.lock().unwrap();
        let tags = repos.get(repo).ok_or_else(|| {
            BackendError::command(format!("An error occurred getting repo '{repo}'"))
        })?;
        Ok(tags.contains(tag).then(|| format!("refs/tags/{tag}")))
    }

    async fn delete_ref(&self, repo: &str, tag: &str) -> Result<(), BackendError> {
        let mut repos = self.repos.lock().unwrap();
        let tags = repos.get_mut(repo).ok_or_else(|| {
            BackendError::command(format!("An error occurred getting repo '{repo}'"))
        })?;
        if !tags.remove(tag) {
            return Err(BackendError::command(format!(
                "An error occurred deleting ref for tag '{tag}' from repo '{repo}'"
            )));
        }
        Ok(())
    }

    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, BackendError> {
        let repos = self.repos.lock().unwrap();
        let tags = repos.get(repo).ok_or_else(|| {
            BackendError::command(format!("An error occurred getting repo '{repo}'"))
        })?;
        Ok(tags.iter().cloned().collect())
    }

    async fn latest_release(&self, repo: &str) -> Result<Option<String>, BackendError> {
        Ok(self
            .releases
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(release_repo, _)| release_repo == repo)
            .map(|(_, tag)| tag.clone()))
    }

    async fn generate_release_notes(
        &self,
        _repo: &str,
        previous_tag: &str,
        tag: &str,
    ) -> Result<String, BackendError> {
        Ok(format!("Changes in {tag} since {previous_tag}"))
    }

    async fn create_release(
        &self,
        repo: &str,
        _tag: &str,
        name: &str,
        _notes: &str,
        _prerelease: bool,
    ) -> Result<(), BackendError> {
        self.push_release(repo, name);
        Ok(())
    }
}

/// Repo-keyed tag-to-digest maps behind the [`ImageRegistryApi`] contract.
#[derive(Clone, Default)]
pub(crate) struct FakeImageRegistry {
    repos: Arc<Mutex<BTreeMap<String, BTreeMap<String, String>>>>,
}

impl FakeImageRegistry {
    pub(crate) fn with_images(repo: &str, images: &[(&str, &str)]) -> Self {
        let registry = Self::default();
        registry.add_repo(repo, images);
        registry
    }

    pub(crate) fn add_repo(&self, repo: &str, images: &[(&str, &str)]) {
        self.repos.lock().unwrap().insert(
            repo.to_string(),
            images
                .iter()
                .map(|(tag, digest)| (tag.to_string(), digest.to_string()))
                .collect(),
        );
    }

    pub(crate) fn tags(&self, repo: &str) -> Vec<String> {
        self.repos
            .lock()
            .unwrap()
            .get(repo)
            .map(|images| images.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn digest(&self, repo: &str, tag: &str) -> Option<String> {
        self.repos
            .lock()
            .unwrap()
            .get(repo)
            .and_then(|images| images.get(tag).cloned())
    }
}

#[async_trait]
impl ImageRegistryApi for FakeImageRegistry {
    async fn describe_images(&self, repo: &str, tag: &str) -> Result<(), BackendError> {
        let repos = self.repos.lock().unwrap();
        let images = repos.get(repo).ok_or_else(|| {
            BackendError::command(format!("Repository '{repo}' not found in registry"))
        })?;
        if !images.contains_key(tag) {
            return Err(BackendError::not_found(format!(
                "Image with tag '{tag}' not found in repo '{repo}'"
            )));
        }
        Ok(())
    }

    async fn batch_get_image(
        &self,
        repo: &str,
        tag: &str,
    ) -> Result<ImageManifest, BackendError> {
        let repos = self.repos.lock().unwrap();
        let images = repos.get(repo).ok_or_else(|| {
            BackendError::command(format!("Repository '{repo}' not found in registry"))
        })?;
        let digest = images.get(tag).ok_or_else(|| {
            BackendError::not_found(format!("Image not found in {repo} for tags: {tag}"))
        })?;
        Ok(ImageManifest {
            manifest: format!("{{\"config\":\"{digest}\"}}"),
            digest: digest.clone(),
        })
    }

    async fn put_image(
        &self,
        repo: &str,
        _manifest: &str,
        digest: &str,
        tag: &str,
    ) -> Result<PutImageOutcome, BackendError> {
        let mut repos = self.repos.lock().unwrap();
        let images = repos.get_mut(repo).ok_or_else(|| {
            BackendError::command(format!("Repository '{repo}' not found in registry"))
        })?;
        match images.get(tag) {
            Some(existing) if existing == digest => Ok(PutImageOutcome::TagAlreadyExists),
            Some(_) => Err(BackendError::command(format!(
                "Tag '{tag}' already exists in repo '{repo}' with a different image digest"
            ))),
            None => {
                images.insert(tag.to_string(), digest.to_string());
                Ok(PutImageOutcome::Created)
            }
        }
    }

    async fn batch_delete_image(&self, repo: &str, tags: &[String]) -> Result<(), BackendError> {
        let mut repos = self.repos.lock().unwrap();
        let images = repos.get_mut(repo).ok_or_else(|| {
            BackendError::command(format!("Repository '{repo}' not found in registry"))
        })?;

        let mut missing = Vec::new();
        for tag in tags {
            if images.remove(tag).is_none() {
                missing.push(tag.clone());
            }
        }
        if !missing.is_empty() {
            return Err(BackendError::not_found(format!(
                "Image not found in {repo} for tags: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
