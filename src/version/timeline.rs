//! Release timeline shown around the compared version
//!
//! - Days policies: releases from the last [`TIMELINE_WINDOW_DAYS`] days (at least
//!   [`TIMELINE_MIN_ENTRIES`]), each expiring `max_days` after its successor shipped.
//! - Versions policies: first and last patch of every supported minor of the
//!   latest major, plus the compared minor. No expiry dates.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use semver::Version;

use crate::config::{TIMELINE_MIN_ENTRIES, TIMELINE_WINDOW_DAYS};
use crate::version::analysis::TimelineEntry;
use crate::version::release::{Release, by_publication};
use crate::version::semver::days_between;

/// Builds the timeline for a days-based policy
pub fn days_timeline(
    releases: &[Release],
    latest: &Version,
    max_days: i64,
    now: DateTime<Utc>,
) -> Vec<TimelineEntry> {
    let window_start = now - Duration::days(TIMELINE_WINDOW_DAYS);
    let mut selected: Vec<&Release> = releases
        .iter()
        .filter(|r| r.published_at >= window_start)
        .collect();

    if selected.len() < TIMELINE_MIN_ENTRIES {
        selected = releases.iter().collect();
        selected.sort_by(|a, b| by_publication(b, a));
        selected.truncate(TIMELINE_MIN_ENTRIES);
    }

    selected.sort_by(|a, b| by_publication(a, b));

    selected
        .iter()
        .enumerate()
        .map(|(i, release)| {
            // Out-of-range expiry dates are treated as never expiring
            let expires_at = selected.get(i + 1).and_then(|next| {
                TimeDelta::try_days(max_days)
                    .and_then(|window| next.published_at.checked_add_signed(window))
            });

            TimelineEntry {
                version: release.version.clone(),
                released_at: release.published_at,
                expires_at,
                days_until_expiry: expires_at.map_or(0, |at| days_between(now, at)),
                is_expired: expires_at.is_some_and(|at| now > at),
                is_latest: release.version == *latest,
            }
        })
        .collect()
}

/// Builds the timeline for a versions-based policy
pub fn versions_timeline(
    releases: &[Release],
    comparison: Option<&Version>,
    latest: &Version,
    max_versions_behind: u64,
) -> Vec<TimelineEntry> {
    let mut minors: BTreeMap<u64, Vec<&Release>> = BTreeMap::new();
    for release in releases.iter().filter(|r| r.version.major == latest.major) {
        minors.entry(release.version.minor).or_default().push(release);
    }

    let oldest_supported = latest.minor.saturating_sub(max_versions_behind);
    let comparison = comparison.filter(|c| c.major == latest.major);

    let mut selected: Vec<&Release> = Vec::new();
    for (minor, group) in &minors {
        let is_compared_minor = comparison.is_some_and(|c| c.minor == *minor);
        if *minor < oldest_supported && !is_compared_minor {
            continue;
        }

        let (Some(first), Some(last)) = (
            group.iter().copied().min_by(|a, b| a.version.cmp(&b.version)),
            group.iter().copied().max_by(|a, b| a.version.cmp(&b.version)),
        ) else {
            continue;
        };
        selected.push(first);
        selected.push(last);

        if is_compared_minor {
            let compared = comparison
                .and_then(|c| group.iter().copied().find(|r| r.version == *c));
            selected.extend(compared);
        }
    }

    selected.sort_by(|a, b| a.version.cmp(&b.version));
    selected.dedup_by(|a, b| a.version == b.version);

    selected
        .into_iter()
        .map(|release| TimelineEntry {
            version: release.version.clone(),
            released_at: release.published_at,
            expires_at: None,
            days_until_expiry: 0,
            is_expired: release.version.minor < oldest_supported,
            is_latest: release.version == *latest,
        })
        .collect()
}
