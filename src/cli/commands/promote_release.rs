//! `promote-release`: copy a release to its stable, public locations.

use crate::cli::OutputManager;
use crate::config::Config;
use crate::error::Result;

pub(super) async fn execute(
    from_version: &str,
    to_version: Option<&str>,
    output: &OutputManager,
) -> Result<()> {
    let config = Config::from_env()?;
    let clients = super::connect(&config).await?;
    let orchestrator = super::build_orchestrator(&config, &clients, output);

    orchestrator.promote_release(from_version, to_version).await?;
    Ok(())
}
