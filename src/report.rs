//! Release listing across backends.

use std::cmp::Ordering;

use clap::ValueEnum;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::artifact::TagArtifact;
use crate::error::Result;
use crate::status::{BackendStatus, StatusChecker};
use crate::version::parse_version;

/// Tag-name conventions a listing can be narrowed to.
///
/// Display-time narrowing only; the backends are never queried with the
/// filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReleaseFilter {
    /// Strict `v`-prefixed semver tags without a nightly/testnet marker
    Incremental,
    /// Tags carrying a `nightly` marker
    Nightly,
    /// Tags of the `testnet` series
    Testnet,
    /// Every tag
    All,
}

impl ReleaseFilter {
    fn matches(&self, tag: &str) -> bool {
        match self {
            ReleaseFilter::All => true,
            ReleaseFilter::Nightly => tag.contains("nightly"),
            ReleaseFilter::Testnet => tag.starts_with("testnet"),
            ReleaseFilter::Incremental => {
                tag.starts_with('v')
                    && parse_version(tag).is_ok()
                    && !tag.contains("nightly")
                    && !tag.starts_with("testnet")
            }
        }
    }
}

/// Render a status table for every known release matching `filter`.
///
/// Releases are the primary repo's tags. Backend errors never abort the
/// listing; they render inline as `? (Error: …)` cells.
pub async fn list_releases(
    tags: &TagArtifact,
    checker: &StatusChecker,
    filter: ReleaseFilter,
) -> Result<String> {
    let mut releases: Vec<String> = tags
        .list_tags()
        .await?
        .into_iter()
        .filter(|tag| filter.matches(tag))
        .collect();
    sort_releases(&mut releases);

    let mut builder = Builder::default();
    let mut header = vec!["RELEASE".to_string()];
    header.extend(checker.backend_names());
    builder.push_record(header);

    for release in &releases {
        let mut row = vec![release.clone()];
        for status in checker.check(release).await {
            row.push(render_status(&status));
        }
        builder.push_record(row);
    }

    Ok(builder.build().with(Style::blank()).to_string())
}

/// Sort semver-aware: parseable tags first in version order, everything
/// else after, lexicographically.
fn sort_releases(releases: &mut [String]) {
    releases.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

fn render_status(status: &BackendStatus) -> String {
    match status {
        BackendStatus::Found => "✓".to_string(),
        BackendStatus::NotFound => "x".to_string(),
        BackendStatus::Error(cause) => format!("? (Error: {cause})"),
    }
}
