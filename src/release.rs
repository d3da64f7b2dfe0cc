//! Matches a merged pull request to the release that shipped it.
use chrono::{DateTime, Utc};

use crate::types::Release;

/// Returns the tag of the earliest release published at or after `merged_at`.
///
/// Releases without a publish time are ignored. The caller only hands in
/// releases published inside the requested window, so a pull request merged
/// close to the window's end reads as unreleased even when a release outside
/// the window shipped it.
pub fn find_release_for(
    merged_at: DateTime<Utc>,
    releases: &[Release],
) -> Option<String> {
    let mut published = releases
        .iter()
        .filter_map(|r| r.published_at.map(|at| (at, r)))
        .collect::<Vec<(DateTime<Utc>, &Release)>>();

    published.sort_by_key(|(at, _)| *at);

    published
        .into_iter()
        .find(|(at, _)| *at >= merged_at)
        .map(|(_, release)| release.tag.clone())
}
