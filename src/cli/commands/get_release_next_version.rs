//! `get-release-next-version`: compute a version bump.
//!
//! Pure computation; needs no configuration and makes no network calls.

use crate::cli::OutputManager;
use crate::error::Result;
use crate::version::{BumpKind, next_version};

pub(super) fn execute(
    bump_type: BumpKind,
    latest_version: &str,
    base_version: Option<&str>,
    output: &OutputManager,
) -> Result<()> {
    let next = next_version(bump_type, latest_version, base_version)?;
    output.println(&next);
    Ok(())
}
