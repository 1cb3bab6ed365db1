//! Command executors coordinating configuration, backends, and output.

mod create_github_release;
mod delete_release;
mod get_release_next_version;
mod get_releases;
mod promote_release;

use std::sync::Arc;

use crate::artifact::{
    BucketArtifact, EcrImageRegistry, GithubTagRegistry, ImageArtifact, ImageRegistryApi,
    ObjectStoreApi, S3ObjectStore, TagArtifact, TagRegistryApi,
};
use crate::cli::{Args, Command, OutputManager};
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::ReleaseOrchestrator;
use crate::status::StatusChecker;

/// Architecture suffixes the node image is published under.
const NODE_IMAGE_ARCHITECTURES: [&str; 2] = ["amd64", "arm64"];
/// Architecture suffixes the functional-test image is published under.
const FUNCTIONAL_TEST_IMAGE_ARCHITECTURES: [&str; 1] = ["amd64"];

/// Execute the parsed command, returning the process exit code.
pub async fn execute_command(args: Args) -> Result<i32> {
    let output = OutputManager::new();
    let command_name = args.command.name();

    let result = match args.command {
        Command::CreateGithubRelease {
            tag_name,
            release_name,
        } => create_github_release::execute(&tag_name, &release_name, &output).await,
        Command::DeleteRelease {
            release_version,
            force,
            no_force,
        } => delete_release::execute(&release_version, force && !no_force, &output).await,
        Command::GetReleaseNextVersion {
            bump_type,
            latest_version,
            release_candidate_base_version,
        } => get_release_next_version::execute(
            bump_type,
            &latest_version,
            release_candidate_base_version.as_deref(),
            &output,
        ),
        Command::GetReleases { filter } => get_releases::execute(filter, &output).await,
        Command::PromoteRelease {
            from_version,
            to_version,
        } => promote_release::execute(&from_version, to_version.as_deref(), &output).await,
    };

    match result {
        Ok(()) => Ok(0),
        Err(err) => {
            output.error(&format!("Command '{command_name}' failed: {err}"));
            Ok(1)
        }
    }
}

/// Concrete clients for the three remote systems.
struct RemoteClients {
    store: Arc<dyn ObjectStoreApi>,
    registry: Arc<dyn TagRegistryApi>,
    images: Arc<dyn ImageRegistryApi>,
}

/// Build authenticated clients for every backend.
async fn connect(config: &Config) -> Result<RemoteClients> {
    let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    Ok(RemoteClients {
        store: Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&aws))),
        registry: Arc::new(GithubTagRegistry::new(&config.github_token)?),
        images: Arc::new(EcrImageRegistry::new(aws_sdk_ecr::Client::new(&aws))),
    })
}

fn build_orchestrator(
    config: &Config,
    clients: &RemoteClients,
    output: &OutputManager,
) -> ReleaseOrchestrator {
    ReleaseOrchestrator::new(
        BucketArtifact::new(clients.store.clone(), config.public_bucket.clone()),
        BucketArtifact::new(clients.store.clone(), config.private_bucket.clone()),
        TagArtifact::new(clients.registry.clone(), config.primary_repo.clone()),
        TagArtifact::new(clients.registry.clone(), config.devops_repo.clone()),
        ImageArtifact::new(
            clients.images.clone(),
            config.node_image_repo.clone(),
            &NODE_IMAGE_ARCHITECTURES,
        ),
        ImageArtifact::new(
            clients.images.clone(),
            config.functional_test_image_repo.clone(),
            &FUNCTIONAL_TEST_IMAGE_ARCHITECTURES,
        ),
        output.clone(),
    )
}

fn build_status_checker(config: &Config, clients: &RemoteClients) -> StatusChecker {
    StatusChecker::new(
        BucketArtifact::new(clients.store.clone(), config.public_bucket.clone()),
        TagArtifact::new(clients.registry.clone(), config.primary_repo.clone()),
        TagArtifact::new(clients.registry.clone(), config.devops_repo.clone()),
        ImageArtifact::new(
            clients.images.clone(),
            config.node_image_repo.clone(),
            &NODE_IMAGE_ARCHITECTURES,
        ),
    )
}
