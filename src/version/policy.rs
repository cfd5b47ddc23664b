//! Expiry policy trait
//!
//! A policy maps the compared release, the latest release and the releases
//! newer than the comparison to a classification. The analyzer only talks to
//! this trait; concrete rules live in [`crate::version::policies`].

use chrono::{DateTime, Utc};
use semver::Version;

use crate::config::PolicyType;
use crate::version::analysis::TimelineEntry;
use crate::version::error::ConfigError;
use crate::version::release::{Release, by_publication};

/// Outcome of evaluating a policy
///
/// At most one of `is_expired`, `is_critical` and `is_warning` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyVerdict {
    pub is_expired: bool,
    pub is_critical: bool,
    pub is_warning: bool,
    /// Whole days since the first newer release was published
    pub days_old: i64,
    /// Distinct newer minor versions within the compared major
    pub versions_behind: u64,
    /// Policy-specific explanation, e.g. days remaining or minors behind
    pub message: String,
}

/// Thresholds echoed into the analysis result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyThresholds {
    pub critical_age_days: i64,
    pub max_age_days: i64,
    pub max_versions_behind: Option<u64>,
}

/// Trait for version expiry policies
pub trait Policy: Send + Sync {
    fn policy_type(&self) -> PolicyType;

    fn thresholds(&self) -> PolicyThresholds;

    /// Checks that the thresholds are consistent
    fn validate(&self) -> Result<(), ConfigError>;

    /// Classifies `comparison` against `latest`
    ///
    /// # Arguments
    /// * `comparison` - The audited release
    /// * `latest` - The release with the greatest version
    /// * `newer_releases` - Releases strictly newer than `comparison`
    /// * `now` - Reference instant for day counts
    fn evaluate(
        &self,
        comparison: &Release,
        latest: &Release,
        newer_releases: &[Release],
        now: DateTime<Utc>,
    ) -> PolicyVerdict;

    /// Builds the display timeline for this policy
    fn timeline(
        &self,
        releases: &[Release],
        comparison: Option<&Version>,
        latest: &Release,
        now: DateTime<Utc>,
    ) -> Vec<TimelineEntry>;
}

/// The newer release with the earliest publication instant
pub fn first_newer_release(newer_releases: &[Release]) -> Option<&Release> {
    newer_releases.iter().min_by(|a, b| by_publication(a, b))
}
