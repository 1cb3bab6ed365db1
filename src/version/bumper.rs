//! Semantic version bump computation for release versions.
//!
//! Release versions are canonically `v`-prefixed; the prefix is stripped
//! before parsing and re-added on render. A version is a release candidate
//! iff it carries prerelease or build metadata.

use clap::ValueEnum;
use semver::{Prerelease, Version};

use crate::error::VersionError;

/// Kinds of version bump understood by [`next_version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BumpKind {
    /// Increment the patch component
    Patch,
    /// Increment the minor component, resetting patch
    Minor,
    /// Increment the major component, resetting minor and patch
    Major,
    /// Increment the prerelease counter
    Prerelease,
    /// Strip prerelease/build metadata from a release candidate
    Promote,
}

impl BumpKind {
    fn as_str(&self) -> &'static str {
        match self {
            BumpKind::Patch => "patch",
            BumpKind::Minor => "minor",
            BumpKind::Major => "major",
            BumpKind::Prerelease => "prerelease",
            BumpKind::Promote => "promote",
        }
    }
}

/// Parse a `v`-prefixed release version under the strict semver grammar.
pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim_start_matches('v')).map_err(|source| {
        VersionError::InvalidVersion {
            version: version.to_string(),
            source,
        }
    })
}

/// Render a version in the canonical `v`-prefixed form.
pub fn render_version(version: &Version) -> String {
    format!("v{version}")
}

/// Whether the version carries prerelease or build metadata.
pub fn is_release_candidate(version: &Version) -> bool {
    !version.pre.is_empty() || !version.build.is_empty()
}

/// Compute the next release version for a bump kind.
///
/// When `base_version` is given and its finalized form differs from the
/// finalized form of `latest_version`, the base supersedes the latest as
/// the bump origin. This lets a new minor/major release candidate series
/// start its own prerelease counter instead of continuing the prior
/// series's: with latest `v0.8.0-rc.39`, base `v0.9.0-rc.0`, and bump
/// `prerelease`, the next version is `v0.9.0-rc.1`.
pub fn next_version(
    bump: BumpKind,
    latest_version: &str,
    base_version: Option<&str>,
) -> Result<String, VersionError> {
    let mut version = parse_version(latest_version)?;

    if let Some(base) = base_version {
        let base = parse_version(base)?;
        if finalize(&base) != finalize(&version) {
            version = base;
        }
    }

    let next = match bump {
        BumpKind::Promote => {
            if !is_release_candidate(&version) {
                return Err(VersionError::InvalidBump {
                    bump: bump.as_str().to_string(),
                    version: render_version(&version),
                });
            }
            finalize(&version)
        }
        BumpKind::Major => Version::new(version.major + 1, 0, 0),
        BumpKind::Minor => Version::new(version.major, version.minor + 1, 0),
        BumpKind::Patch => Version::new(version.major, version.minor, version.patch + 1),
        BumpKind::Prerelease => bump_prerelease(&version)?,
    };

    Ok(render_version(&next))
}

fn finalize(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

/// Increment the trailing numeric prerelease identifier.
///
/// A non-numeric tail gains a `.0`; a finalized version starts an `rc.0`
/// counter on the same patch level.
fn bump_prerelease(version: &Version) -> Result<Version, VersionError> {
    let next_pre = if version.pre.is_empty() {
        "rc.0".to_string()
    } else {
        let mut parts: Vec<String> = version.pre.split('.').map(str::to_string).collect();
        match parts.last().and_then(|part| part.parse::<u64>().ok()) {
            Some(counter) => {
                let last = parts.len() - 1;
                parts[last] = (counter + 1).to_string();
            }
            None => parts.push("0".to_string()),
        }
        parts.join(".")
    };

    let mut next = finalize(version);
    next.pre = Prerelease::new(&next_pre).map_err(|source| VersionError::InvalidVersion {
        version: render_version(version),
        source,
    })?;
    Ok(next)
}
