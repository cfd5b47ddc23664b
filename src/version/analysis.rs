//! Analysis result consumed by the report formatters

use std::fmt;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::PolicyType;
use crate::version::release::Release;

/// Compliance status of the compared version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Current,
    Warning,
    Critical,
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Expired => "expired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the release timeline shown around the compared version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub version: Version,
    #[serde(rename = "released")]
    pub released_at: DateTime<Utc>,
    /// Absent when the policy has no expiry date for this release
    #[serde(rename = "expires")]
    pub expires_at: Option<DateTime<Utc>>,
    pub days_until_expiry: i64,
    pub is_expired: bool,
    pub is_latest: bool,
}

/// Everything the formatters need to know about one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// `owner/repo` of the audited project
    pub repository: String,
    pub latest_version: Version,
    pub comparison_version: Option<Version>,
    pub comparison_released_at: Option<DateTime<Utc>>,
    pub is_latest: bool,
    pub is_expired: bool,
    pub is_critical: bool,
    /// Number of releases strictly newer than the comparison
    pub releases_behind: usize,
    /// Whole days since the first newer release was published
    pub days_since_update: i64,
    /// Distinct newer minors within the comparison's major (versions policy only)
    pub minor_versions_behind: Option<u64>,
    pub first_newer_version: Option<Version>,
    pub first_newer_release_date: Option<DateTime<Utc>>,
    /// Releases newer than the comparison, oldest first
    pub newer_releases: Vec<Release>,
    pub recent_releases: Vec<TimelineEntry>,
    pub message: String,
    pub critical_age_days: i64,
    pub max_age_days: i64,
    pub max_versions_behind: Option<u64>,
    pub policy_type: Option<PolicyType>,
}

impl AnalysisResult {
    /// A result that only reports the latest release
    pub fn latest_only(repository: &str, latest: &Release) -> Self {
        Self {
            repository: repository.to_string(),
            latest_version: latest.version.clone(),
            comparison_version: None,
            comparison_released_at: None,
            is_latest: false,
            is_expired: false,
            is_critical: false,
            releases_behind: 0,
            days_since_update: 0,
            minor_versions_behind: None,
            first_newer_version: None,
            first_newer_release_date: None,
            newer_releases: Vec::new(),
            recent_releases: Vec::new(),
            message: format!("Latest release of {} is {}", repository, latest.version),
            critical_age_days: 0,
            max_age_days: 0,
            max_versions_behind: None,
            policy_type: None,
        }
    }

    /// Derived status; exactly one applies to every result
    pub fn status(&self) -> Status {
        if self.comparison_version.is_none() || self.is_latest {
            Status::Current
        } else if self.is_expired {
            Status::Expired
        } else if self.is_critical {
            Status::Critical
        } else if self.releases_behind > 0 {
            Status::Warning
        } else {
            Status::Current
        }
    }
}

/// JSON form of [`AnalysisResult`]
#[derive(Serialize)]
struct AnalysisDocument<'a> {
    repository: &'a str,
    latest_version: &'a Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison_version: Option<&'a Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison_released_at: Option<DateTime<Utc>>,
    is_latest: bool,
    is_expired: bool,
    is_critical: bool,
    releases_behind: usize,
    days_since_update: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor_versions_behind: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_newer_version: Option<&'a Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_newer_release_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "is_empty")]
    newer_releases: &'a [Release],
    recent_releases: &'a [TimelineEntry],
    message: &'a str,
    status: Status,
    critical_age_days: i64,
    max_age_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_versions_behind: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policy_type: Option<PolicyType>,
}

fn is_empty(releases: &&[Release]) -> bool {
    releases.is_empty()
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AnalysisDocument {
            repository: &self.repository,
            latest_version: &self.latest_version,
            comparison_version: self.comparison_version.as_ref(),
            comparison_released_at: self.comparison_released_at,
            is_latest: self.is_latest,
            is_expired: self.is_expired,
            is_critical: self.is_critical,
            releases_behind: self.releases_behind,
            days_since_update: self.days_since_update,
            minor_versions_behind: self.minor_versions_behind,
            first_newer_version: self.first_newer_version.as_ref(),
            first_newer_release_date: self.first_newer_release_date,
            newer_releases: &self.newer_releases,
            recent_releases: &self.recent_releases,
            message: &self.message,
            status: self.status(),
            critical_age_days: self.critical_age_days,
            max_age_days: self.max_age_days,
            max_versions_behind: self.max_versions_behind,
            policy_type: self.policy_type,
        }
        .serialize(serializer)
    }
}
