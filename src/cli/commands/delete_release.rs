//! `delete-release`: remove a release from every backend.

use crate::cli::OutputManager;
use crate::config::Config;
use crate::error::Result;

pub(super) async fn execute(version: &str, force: bool, output: &OutputManager) -> Result<()> {
    let config = Config::from_env()?;
    let clients = super::connect(&config).await?;
    let orchestrator = super::build_orchestrator(&config, &clients, output);

    orchestrator.delete_release(version, force).await?;
    Ok(())
}
