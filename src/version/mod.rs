//! Version policy for computing release version bumps.

mod bumper;

pub use bumper::{BumpKind, is_release_candidate, next_version, parse_version, render_version};
