//! Tag registry adapter over the GitHub REST API.
//!
//! A release maps to the ref `tags/{version}` in each configured repo. The
//! registry is also the source of truth for the set of known releases
//! (every tag of the primary repo) and carries GitHub release objects.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::json;

use super::TagRegistryApi;
use crate::error::BackendError;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const TAGS_PER_PAGE: usize = 100;

/// Interface for working with one repo's release tags.
#[derive(Clone)]
pub struct TagArtifact {
    api: Arc<dyn TagRegistryApi>,
    repo: String,
}

impl TagArtifact {
    /// Create an adapter over `repo` (owner/name).
    pub fn new(api: Arc<dyn TagRegistryApi>, repo: impl Into<String>) -> Self {
        Self {
            api,
            repo: repo.into(),
        }
    }

    /// Name of the repo this adapter targets.
    pub fn repo_name(&self) -> &str {
        &self.repo
    }

    /// Check that the release tag exists in the repo.
    pub async fn check(&self, version: &str) -> Result<(), BackendError> {
        match self.api.get_tag_ref(&self.repo, version).await? {
            Some(_) => Ok(()),
            None => Err(BackendError::not_found(format!(
                "Ref for tag '{version}' not found in repo '{}'",
                self.repo
            ))),
        }
    }

    /// Delete the release tag ref.
    ///
    /// The preceding lookup keeps "tag was never there" distinct from
    /// "deletion failed."
    pub async fn delete_ref(&self, version: &str) -> Result<(), BackendError> {
        self.check(version).await?;
        self.api.delete_ref(&self.repo, version).await
    }

    /// List every tag name in the repo.
    pub async fn list_tags(&self) -> Result<Vec<String>, BackendError> {
        self.api.list_tags(&self.repo).await
    }

    /// Create a GitHub release `name` from the existing `tag`.
    ///
    /// Release notes are generated relative to the most recently created
    /// release when one exists; the first release of a repo gets empty
    /// notes.
    pub async fn create_release(
        &self,
        tag: &str,
        name: &str,
        prerelease: bool,
    ) -> Result<(), BackendError> {
        let notes = match self.api.latest_release(&self.repo).await? {
            Some(previous_tag) => {
                self.api
                    .generate_release_notes(&self.repo, &previous_tag, name)
                    .await?
            }
            None => String::new(),
        };
        self.api
            .create_release(&self.repo, tag, name, &notes, prerelease)
            .await
    }
}

/// [`TagRegistryApi`] backed by the GitHub REST API.
pub struct GithubTagRegistry {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Deserialize)]
struct ReleaseEntry {
    tag_name: String,
}

#[derive(Deserialize)]
struct GeneratedNotes {
    body: String,
}

impl GithubTagRegistry {
    /// Build an authenticated client for the GitHub REST API.
    pub fn new(token: &str) -> Result<Self, BackendError> {
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| BackendError::command(format!("Invalid GitHub token: {err}")))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let http = Client::builder()
            .user_agent(concat!("kodegen-release-manager/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|err| {
                BackendError::command(format!("Failed to build GitHub HTTP client: {err}"))
            })?;

        Ok(Self {
            http,
            base_url: GITHUB_API_BASE.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

fn ensure_success(response: Response, context: &str) -> Result<Response, BackendError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(BackendError::command(format!(
            "{context}: HTTP {}",
            response.status()
        )))
    }
}

fn transport_error(err: reqwest::Error, context: &str) -> BackendError {
    BackendError::command(format!("{context}: {err}"))
}

#[async_trait]
impl TagRegistryApi for GithubTagRegistry {
    async fn get_tag_ref(&self, repo: &str, tag: &str) -> Result<Option<String>, BackendError> {
        let context =
            format!("An error occurred getting ref for tag '{tag}' from repo '{repo}'");
        let response = self
            .http
            .get(self.url(&format!("repos/{repo}/git/ref/tags/{tag}")))
            .send()
            .await
            .map_err(|err| transport_error(err, &context))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let git_ref: GitRef = ensure_success(response, &context)?
            .json()
            .await
            .map_err(|err| transport_error(err, &context))?;
        Ok(Some(git_ref.git_ref))
    }

    async fn delete_ref(&self, repo: &str, tag: &str) -> Result<(), BackendError> {
        let context =
            format!("An error occurred deleting ref for tag '{tag}' from repo '{repo}'");
        let response = self
            .http
            .delete(self.url(&format!("repos/{repo}/git/refs/tags/{tag}")))
            .send()
            .await
            .map_err(|err| transport_error(err, &context))?;
        ensure_success(response, &context)?;
        Ok(())
    }

    async fn list_tags(&self, repo: &str) -> Result<Vec<String>, BackendError> {
        let context = format!("An error occurred getting tags from repo '{repo}'");
        let mut tags = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .http
                .get(self.url(&format!("repos/{repo}/tags")))
                .query(&[("per_page", TAGS_PER_PAGE), ("page", page)])
                .send()
                .await
                .map_err(|err| transport_error(err, &context))?;
            let batch: Vec<TagEntry> = ensure_success(response, &context)?
                .json()
                .await
                .map_err(|err| transport_error(err, &context))?;

            let last_page = batch.len() < TAGS_PER_PAGE;
            tags.extend(batch.into_iter().map(|tag| tag.name));
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(tags)
    }

    async fn latest_release(&self, repo: &str) -> Result<Option<String>, BackendError> {
        let context = format!("An error occurred getting releases from repo '{repo}'");
        let response = self
            .http
            .get(self.url(&format!("repos/{repo}/releases")))
            .query(&[("per_page", 1usize)])
            .send()
            .await
            .map_err(|err| transport_error(err, &context))?;
        let releases: Vec<ReleaseEntry> = ensure_success(response, &context)?
            .json()
            .await
            .map_err(|err| transport_error(err, &context))?;
        Ok(releases.into_iter().next().map(|release| release.tag_name))
    }

    async fn generate_release_notes(
        &self,
        repo: &str,
        previous_tag: &str,
        tag: &str,
    ) -> Result<String, BackendError> {
        let context =
            format!("An error occurred generating release notes for '{tag}' in repo '{repo}'");
        let response = self
            .http
            .post(self.url(&format!("repos/{repo}/releases/generate-notes")))
            .json(&json!({
                "previous_tag_name": previous_tag,
                "tag_name": tag,
            }))
            .send()
            .await
            .map_err(|err| transport_error(err, &context))?;
        let notes: GeneratedNotes = ensure_success(response, &context)?
            .json()
            .await
            .map_err(|err| transport_error(err, &context))?;
        Ok(notes.body)
    }

    async fn create_release(
        &self,
        repo: &str,
        tag: &str,
        name: &str,
        notes: &str,
        prerelease: bool,
    ) -> Result<(), BackendError> {
        let context =
            format!("An error occurred creating release '{name}' in repo '{repo}'");
        let response = self
            .http
            .post(self.url(&format!("repos/{repo}/releases")))
            .json(&json!({
                "tag_name": tag,
                "name": name,
                "body": notes,
                "prerelease": prerelease,
                "generate_release_notes": false,
            }))
            .send()
            .await
            .map_err(|err| transport_error(err, &context))?;
        ensure_success(response, &context)?;
        Ok(())
    }
}
