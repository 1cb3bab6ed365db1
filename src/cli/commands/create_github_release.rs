//! `create-github-release`: create a GitHub release from an existing tag.

use crate::cli::OutputManager;
use crate::config::Config;
use crate::error::Result;

pub(super) async fn execute(
    tag_name: &str,
    release_name: &str,
    output: &OutputManager,
) -> Result<()> {
    let config = Config::from_env()?;
    let clients = super::connect(&config).await?;
    let orchestrator = super::build_orchestrator(&config, &clients, output);

    orchestrator
        .create_github_release(tag_name, release_name)
        .await
}
