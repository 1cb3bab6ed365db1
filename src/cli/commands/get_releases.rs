//! `get-releases`: tabulate per-backend status for every known release.

use crate::artifact::TagArtifact;
use crate::cli::OutputManager;
use crate::config::Config;
use crate::error::Result;
use crate::report::{ReleaseFilter, list_releases};

pub(super) async fn execute(filter: ReleaseFilter, output: &OutputManager) -> Result<()> {
    let config = Config::from_env()?;
    let clients = super::connect(&config).await?;
    let tags = TagArtifact::new(clients.registry.clone(), config.primary_repo.clone());
    let checker = super::build_status_checker(&config, &clients);

    let table = list_releases(&tags, &checker, filter).await?;
    output.println(&table);
    Ok(())
}
