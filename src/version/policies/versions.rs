//! Versions-based expiry policy
//!
//! Supports an N-minor window within the current major. Patch skew is ignored;
//! any newer major expires the compared version outright.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use semver::Version;

use crate::config::PolicyType;
use crate::version::analysis::TimelineEntry;
use crate::version::error::ConfigError;
use crate::version::policy::{Policy, PolicyThresholds, PolicyVerdict, first_newer_release};
use crate::version::release::Release;
use crate::version::semver::days_between;
use crate::version::timeline::versions_timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionsPolicy {
    max_versions_behind: u64,
}

impl VersionsPolicy {
    pub fn new(max_versions_behind: u64) -> Self {
        Self {
            max_versions_behind,
        }
    }
}

/// Counts distinct minors newer than `comparison` within its major
fn minors_behind(comparison: &Version, newer_releases: &[Release]) -> u64 {
    newer_releases
        .iter()
        .map(|r| &r.version)
        .filter(|v| v.major == comparison.major && v.minor > comparison.minor)
        .map(|v| v.minor)
        .collect::<BTreeSet<_>>()
        .len() as u64
}

impl Policy for VersionsPolicy {
    fn policy_type(&self) -> PolicyType {
        PolicyType::Versions
    }

    fn thresholds(&self) -> PolicyThresholds {
        PolicyThresholds {
            critical_age_days: 0,
            max_age_days: 0,
            max_versions_behind: Some(self.max_versions_behind),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_versions_behind < 1 {
            return Err(ConfigError::InvalidMaxVersions(self.max_versions_behind));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        comparison: &Release,
        latest: &Release,
        newer_releases: &[Release],
        now: DateTime<Utc>,
    ) -> PolicyVerdict {
        let days_old = first_newer_release(newer_releases)
            .map_or(0, |first| days_between(first.published_at, now));
        let versions_behind = minors_behind(&comparison.version, newer_releases);
        let major_changed = newer_releases
            .iter()
            .any(|r| r.version.major > comparison.version.major);

        let limit = self.max_versions_behind;
        let (is_expired, is_critical, is_warning) = if major_changed || versions_behind > limit {
            (true, false, false)
        } else if versions_behind == limit {
            (false, true, false)
        } else {
            (false, false, versions_behind > 0)
        };

        let message = if major_changed {
            format!(
                "major version {} is no longer supported (latest is {})",
                comparison.version.major, latest.version
            )
        } else if versions_behind == 0 {
            "on the latest minor version".to_string()
        } else if is_expired {
            format!(
                "{} minor versions behind, more than the {} supported",
                versions_behind, limit
            )
        } else if is_critical {
            format!(
                "{} minor versions behind, the oldest supported minor",
                versions_behind
            )
        } else {
            format!(
                "{} minor versions behind ({} supported)",
                versions_behind, limit
            )
        };

        PolicyVerdict {
            is_expired,
            is_critical,
            is_warning,
            days_old,
            versions_behind,
            message,
        }
    }

    fn timeline(
        &self,
        releases: &[Release],
        comparison: Option<&Version>,
        latest: &Release,
        _now: DateTime<Utc>,
    ) -> Vec<TimelineEntry> {
        versions_timeline(
            releases,
            comparison,
            &latest.version,
            self.max_versions_behind,
        )
    }
}
